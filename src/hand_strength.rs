//! Made-hand category and draw flags for a player's hole cards against the
//! shared board. This approximates the category a HUD would show; it is not a
//! showdown evaluator and never compares two hands.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cards::{Card, Suit};
use crate::error::{AnalyticsError, AnalyticsResult};

/// Primary category, listed from weakest to strongest display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PrimaryCategory {
    #[serde(rename = "Air")]
    Air,
    #[serde(rename = "Underpair")]
    Underpair,
    #[serde(rename = "Bottom Pair")]
    BottomPair,
    #[serde(rename = "Middle Pair")]
    MiddlePair,
    #[serde(rename = "Top Pair")]
    TopPair,
    #[serde(rename = "Overpair")]
    Overpair,
    #[serde(rename = "Two Pair")]
    TwoPair,
    #[serde(rename = "Trips/Set")]
    TripsOrSet,
    #[serde(rename = "Straight")]
    Straight,
    #[serde(rename = "Flush")]
    Flush,
    #[serde(rename = "Full House")]
    FullHouse,
    #[serde(rename = "Quads")]
    Quads,
}

impl PrimaryCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimaryCategory::Air => "Air",
            PrimaryCategory::Underpair => "Underpair",
            PrimaryCategory::BottomPair => "Bottom Pair",
            PrimaryCategory::MiddlePair => "Middle Pair",
            PrimaryCategory::TopPair => "Top Pair",
            PrimaryCategory::Overpair => "Overpair",
            PrimaryCategory::TwoPair => "Two Pair",
            PrimaryCategory::TripsOrSet => "Trips/Set",
            PrimaryCategory::Straight => "Straight",
            PrimaryCategory::Flush => "Flush",
            PrimaryCategory::FullHouse => "Full House",
            PrimaryCategory::Quads => "Quads",
        }
    }
}

impl fmt::Display for PrimaryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandClassification {
    pub primary: PrimaryCategory,
    pub has_flush_draw: bool,
    pub has_oesd: bool,
    pub made_flush: bool,
    pub made_straight: bool,
    pub made_full_house: bool,
}

impl HandClassification {
    pub fn has_draw(&self) -> bool {
        self.has_flush_draw || self.has_oesd
    }
}

/// Classifies `hole` against a 3 to 5 card `board`.
///
/// Categories are checked in priority order and the first match wins:
/// full house, quads, flush, straight, trips/set, two pair, overpair,
/// top/middle/bottom pair, underpair, air.
pub fn classify(hole: &[Card; 2], board: &[Card]) -> AnalyticsResult<HandClassification> {
    if !(3..=5).contains(&board.len()) {
        return Err(AnalyticsError::InvalidBoardSize(board.len()));
    }

    let combined: Vec<Card> = hole.iter().chain(board.iter()).copied().collect();

    let mut rank_counts: HashMap<u8, u8> = HashMap::new();
    for card in &combined {
        *rank_counts.entry(card.value()).or_insert(0) += 1;
    }
    let mut counts_sorted: Vec<u8> = rank_counts.values().copied().collect();
    counts_sorted.sort_unstable_by(|a, b| b.cmp(a));

    let made_full_house = counts_sorted.len() >= 2 && counts_sorted[0] >= 3 && counts_sorted[1] >= 2;
    let made_quads = counts_sorted.first().is_some_and(|&c| c >= 4);
    let made_trips = counts_sorted.first().is_some_and(|&c| c >= 3);
    let made_two_pair = counts_sorted.iter().filter(|&&c| c >= 2).count() >= 2;

    let made_flush = flush_suit(&combined, 5).is_some();
    let (made_straight, has_oesd) = straight_info(hole, &combined);
    let has_flush_draw = !made_flush && has_flush_draw(hole, &combined);

    let mut board_unique: Vec<u8> = board
        .iter()
        .map(|c| c.value())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    board_unique.reverse();
    let top_board = board_unique[0];

    let pocket_pair = hole[0].rank == hole[1].rank;
    let hole_values = [hole[0].value(), hole[1].value()];
    let hole_hits = |board_rank: Option<&u8>| {
        board_rank.is_some_and(|r| hole_values.contains(r))
    };

    let primary = if made_full_house {
        PrimaryCategory::FullHouse
    } else if made_quads {
        PrimaryCategory::Quads
    } else if made_flush {
        PrimaryCategory::Flush
    } else if made_straight {
        PrimaryCategory::Straight
    } else if made_trips {
        PrimaryCategory::TripsOrSet
    } else if made_two_pair {
        PrimaryCategory::TwoPair
    } else if pocket_pair && hole_values[0] > top_board {
        PrimaryCategory::Overpair
    } else if hole_hits(board_unique.first()) {
        PrimaryCategory::TopPair
    } else if hole_hits(board_unique.get(1)) {
        PrimaryCategory::MiddlePair
    } else if hole_hits(board_unique.get(2)) {
        PrimaryCategory::BottomPair
    } else if pocket_pair && hole_values[0] < top_board {
        PrimaryCategory::Underpair
    } else {
        PrimaryCategory::Air
    };

    Ok(HandClassification {
        primary,
        has_flush_draw,
        has_oesd,
        made_flush,
        made_straight,
        made_full_house,
    })
}

fn flush_suit(cards: &[Card], threshold: usize) -> Option<Suit> {
    let mut counts: HashMap<Suit, usize> = HashMap::new();
    for card in cards {
        *counts.entry(card.suit).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .find(|&(_, n)| n >= threshold)
        .map(|(suit, _)| suit)
}

fn has_flush_draw(hole: &[Card; 2], combined: &[Card]) -> bool {
    let mut counts: HashMap<Suit, usize> = HashMap::new();
    for card in combined {
        *counts.entry(card.suit).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .any(|(suit, n)| n == 4 && hole.iter().any(|c| c.suit == suit))
}

/// Returns `(made_straight, oesd)`. Aces also count as 1 for the wheel.
fn straight_info(hole: &[Card; 2], combined: &[Card]) -> (bool, bool) {
    let mut ranks: BTreeSet<u8> = combined.iter().map(|c| c.value()).collect();
    if ranks.contains(&14) {
        ranks.insert(1);
    }

    let made = (1..=10u8).any(|start| (start..start + 5).all(|r| ranks.contains(&r)));
    if made {
        return (true, false);
    }

    let mut hole_ranks: BTreeSet<u8> = hole.iter().map(|c| c.value()).collect();
    if hole_ranks.contains(&14) {
        hole_ranks.insert(1);
    }

    // Both ends of the window must exist: A-2-3-4 and J-Q-K-A are gutshots.
    let oesd = (2..=10u8).any(|start| {
        let window = start..start + 4;
        window.clone().all(|r| ranks.contains(&r)) && window.clone().any(|r| hole_ranks.contains(&r))
    });
    (false, oesd)
}
