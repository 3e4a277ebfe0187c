//! Table geometry: maps dealt players onto canonical positions.
//!
//! The primary path rotates the sorted seat list from the dealer button, so a
//! dead small blind never shifts anyone's position. Without a usable dealer the
//! blind posters and the preflop action order are used instead. Anything left
//! over is reported as [`SeatPosition::Unknown`].

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "SB")]
    SB,
    #[serde(rename = "BB")]
    BB,
    #[serde(rename = "UTG")]
    UTG,
    #[serde(rename = "UTG+1")]
    UTG1,
    #[serde(rename = "UTG+2")]
    UTG2,
    #[serde(rename = "LJ")]
    LJ,
    #[serde(rename = "HJ")]
    HJ,
    #[serde(rename = "CO")]
    CO,
    #[serde(rename = "BTN")]
    BTN,
}

impl Position {
    pub const ALL: [Position; 9] = [
        Position::SB,
        Position::BB,
        Position::UTG,
        Position::UTG1,
        Position::UTG2,
        Position::LJ,
        Position::HJ,
        Position::CO,
        Position::BTN,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::SB => "SB",
            Position::BB => "BB",
            Position::UTG => "UTG",
            Position::UTG1 => "UTG+1",
            Position::UTG2 => "UTG+2",
            Position::LJ => "LJ",
            Position::HJ => "HJ",
            Position::CO => "CO",
            Position::BTN => "BTN",
        }
    }

    pub fn from_str(s: &str) -> Option<Position> {
        match s.trim().to_uppercase().as_str() {
            "SB" => Some(Position::SB),
            "BB" => Some(Position::BB),
            "UTG" => Some(Position::UTG),
            "UTG+1" | "UTG1" => Some(Position::UTG1),
            "UTG+2" | "UTG2" => Some(Position::UTG2),
            "LJ" | "MP" => Some(Position::LJ),
            "HJ" => Some(Position::HJ),
            "CO" => Some(Position::CO),
            "BTN" | "BU" => Some(Position::BTN),
            _ => None,
        }
    }

    /// Display order index (SB first, BTN last).
    pub fn order(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Either a resolved position or an explicit marker that resolution failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeatPosition {
    Resolved(Position),
    Unknown,
}

impl SeatPosition {
    pub fn position(&self) -> Option<Position> {
        match self {
            SeatPosition::Resolved(p) => Some(*p),
            SeatPosition::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, SeatPosition::Unknown)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SeatPosition::Resolved(p) => p.as_str(),
            SeatPosition::Unknown => "UNKNOWN",
        }
    }

    /// Display order with `UNKNOWN` after every real position.
    pub fn order(&self) -> usize {
        match self {
            SeatPosition::Resolved(p) => p.order(),
            SeatPosition::Unknown => Position::ALL.len(),
        }
    }

    pub fn from_label(label: &str) -> SeatPosition {
        Position::from_str(label).map_or(SeatPosition::Unknown, SeatPosition::Resolved)
    }
}

impl fmt::Display for SeatPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Canonical position list for `n` dealt players, in seat order starting at
/// the small blind and ending at the button.
pub fn canonical_positions(n: usize) -> Option<&'static [Position]> {
    use Position::*;
    let template: &'static [Position] = match n {
        2 => &[SB, BB],
        3 => &[SB, BB, BTN],
        4 => &[SB, BB, CO, BTN],
        5 => &[SB, BB, UTG, CO, BTN],
        6 => &[SB, BB, UTG, HJ, CO, BTN],
        7 => &[SB, BB, UTG, UTG1, HJ, CO, BTN],
        8 => &[SB, BB, UTG, UTG1, UTG2, HJ, CO, BTN],
        9 => &[SB, BB, UTG, UTG1, UTG2, LJ, HJ, CO, BTN],
        _ => return None,
    };
    Some(template)
}

/// Postflop acting rank: higher acts later. Heads-up the small blind holds the
/// button and therefore acts last after the flop.
pub fn postflop_rank(position: Position, dealt_count: usize) -> usize {
    if dealt_count == 2 {
        return match position {
            Position::SB => 1,
            _ => 0,
        };
    }
    position.order()
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seat {
    pub name: String,
    pub seat: u32,
    pub dealer: bool,
    pub chips: f64,
}

/// Inputs for one hand. Names outside `dealt` are ignored everywhere.
#[derive(Debug, Clone, Copy)]
pub struct ResolveInput<'a> {
    pub seats: &'a [Seat],
    pub dealt: &'a [String],
    pub sb_poster: Option<&'a str>,
    pub bb_poster: Option<&'a str>,
    pub dealer_seat: Option<u32>,
    pub action_order: &'a [String],
}

pub type PositionMap = BTreeMap<String, SeatPosition>;

/// Maps every dealt player to exactly one position.
pub fn resolve(input: &ResolveInput<'_>) -> PositionMap {
    let dealt: HashSet<&str> = input.dealt.iter().map(String::as_str).collect();
    let mut seated: Vec<&Seat> = input
        .seats
        .iter()
        .filter(|s| dealt.contains(s.name.as_str()))
        .collect();
    seated.sort_by_key(|s| s.seat);
    let mut names: HashSet<String> = HashSet::new();
    seated.retain(|s| names.insert(s.name.clone()));

    if let Some(map) = rotate_from_dealer(&seated, input.dealer_seat) {
        return map;
    }
    log::debug!("seat rotation unavailable; falling back to blind and action order");
    from_blinds_and_action(&seated, input)
}

fn rotate_from_dealer(seated: &[&Seat], dealer_seat: Option<u32>) -> Option<PositionMap> {
    let n = seated.len();
    let template = canonical_positions(n)?;
    let dealer_seat = dealer_seat?;

    // A button on an empty seat belongs to the nearest dealt seat before it.
    let dealer_idx = seated
        .iter()
        .rposition(|s| s.seat <= dealer_seat)
        .unwrap_or(n - 1);

    let mut map = PositionMap::new();
    if n == 2 {
        map.insert(seated[dealer_idx].name.clone(), SeatPosition::Resolved(Position::SB));
        map.insert(seated[1 - dealer_idx].name.clone(), SeatPosition::Resolved(Position::BB));
        return Some(map);
    }

    for (i, position) in template.iter().enumerate() {
        let seat = seated[(dealer_idx + 1 + i) % n];
        map.insert(seat.name.clone(), SeatPosition::Resolved(*position));
    }
    Some(map)
}

fn from_blinds_and_action(seated: &[&Seat], input: &ResolveInput<'_>) -> PositionMap {
    let mut map: PositionMap = seated
        .iter()
        .map(|s| (s.name.clone(), SeatPosition::Unknown))
        .collect();
    let template = match canonical_positions(seated.len()) {
        Some(t) => t,
        None => return map,
    };

    for (poster, position) in [(input.sb_poster, Position::SB), (input.bb_poster, Position::BB)] {
        let Some(name) = poster else { continue };
        if let Some(slot) = map.get_mut(name) {
            if slot.is_unknown() && template.contains(&position) {
                *slot = SeatPosition::Resolved(position);
            }
        }
    }

    // Blind seats come only from posters; an unposted blind stays unknown.
    let mut remaining = template.iter().skip(2);
    let mut seen: HashSet<&str> = HashSet::new();
    for name in input.action_order {
        if !seen.insert(name.as_str()) {
            continue;
        }
        let Some(slot) = map.get_mut(name.as_str()) else { continue };
        if !slot.is_unknown() {
            continue;
        }
        match remaining.next() {
            Some(position) => *slot = SeatPosition::Resolved(*position),
            None => break,
        }
    }

    map
}
