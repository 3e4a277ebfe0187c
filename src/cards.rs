use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, AnalyticsResult};

pub const SUITS_STR: &str = "shdc";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
    Ace = 14,
}

impl Rank {
    pub fn from_char(c: char) -> AnalyticsResult<Rank> {
        match c.to_ascii_uppercase() {
            '2' => Ok(Rank::Two),
            '3' => Ok(Rank::Three),
            '4' => Ok(Rank::Four),
            '5' => Ok(Rank::Five),
            '6' => Ok(Rank::Six),
            '7' => Ok(Rank::Seven),
            '8' => Ok(Rank::Eight),
            '9' => Ok(Rank::Nine),
            'T' => Ok(Rank::Ten),
            'J' => Ok(Rank::Jack),
            'Q' => Ok(Rank::Queen),
            'K' => Ok(Rank::King),
            'A' => Ok(Rank::Ace),
            _ => Err(AnalyticsError::InvalidRank(c)),
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Rank::Two => '2',
            Rank::Three => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            Rank::Ace => 'A',
        }
    }

    /// Numeric value, Ace high (14).
    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn is_broadway(self) -> bool {
        self >= Rank::Jack
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Suit {
    Spades,
    Hearts,
    Diamonds,
    Clubs,
}

impl Suit {
    pub fn from_char(c: char) -> AnalyticsResult<Suit> {
        match c.to_ascii_lowercase() {
            's' => Ok(Suit::Spades),
            'h' => Ok(Suit::Hearts),
            'd' => Ok(Suit::Diamonds),
            'c' => Ok(Suit::Clubs),
            _ => Err(AnalyticsError::InvalidSuit(c)),
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Suit::Spades => 's',
            Suit::Hearts => 'h',
            Suit::Diamonds => 'd',
            Suit::Clubs => 'c',
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Suit::Spades => "\u{2660}",
            Suit::Hearts => "\u{2665}",
            Suit::Diamonds => "\u{2666}",
            Suit::Clubs => "\u{2663}",
        }
    }

    fn is_suit_char(c: char) -> bool {
        SUITS_STR.contains(c.to_ascii_lowercase())
    }
}

/// A single playing card. Ordering is by rank, then suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Card {
        Card { rank, suit }
    }

    pub fn value(&self) -> u8 {
        self.rank.value()
    }

    pub fn pretty(&self) -> String {
        format!("{}{}", self.rank.to_char(), self.suit.symbol())
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.to_char(), self.suit.to_char())
    }
}

impl From<Card> for String {
    fn from(card: Card) -> String {
        card.to_string()
    }
}

impl TryFrom<String> for Card {
    type Error = AnalyticsError;

    fn try_from(value: String) -> AnalyticsResult<Card> {
        parse_card(&value)
    }
}

/// Parses one card token. Accepts rank-first (`Ah`) and suit-first (`HA`)
/// layouts in any case, and `10` for ten (`10h`, `H10`).
pub fn parse_card(token: &str) -> AnalyticsResult<Card> {
    let trimmed = token.trim();
    let normalized = trimmed.replace("10", "T");
    let chars: Vec<char> = normalized.chars().collect();
    if chars.len() != 2 {
        return Err(AnalyticsError::InvalidCardNotation(trimmed.to_string()));
    }
    let (first, second) = (chars[0], chars[1]);

    if Suit::is_suit_char(first) && !Suit::is_suit_char(second) {
        let suit = Suit::from_char(first)?;
        let rank = Rank::from_char(second)?;
        return Ok(Card::new(rank, suit));
    }

    let rank = Rank::from_char(first)?;
    let suit = Suit::from_char(second)?;
    Ok(Card::new(rank, suit))
}

/// Parses whitespace-separated card tokens. Any malformed token rejects the
/// whole input, so a board is never half-parsed.
pub fn parse_cards(text: &str) -> AnalyticsResult<Vec<Card>> {
    text.split_whitespace().map(parse_card).collect()
}

/// Like [`parse_cards`], but also accepts the compact `AsKd7c` form.
pub fn parse_board(notation: &str) -> AnalyticsResult<Vec<Card>> {
    if notation.split_whitespace().count() > 1 {
        return parse_cards(notation);
    }
    let compact = notation.trim().replace(',', "").replace("10", "T");
    if compact.len() % 2 != 0 || !compact.is_ascii() {
        return Err(AnalyticsError::InvalidBoardNotation(notation.trim().to_string()));
    }
    compact
        .as_bytes()
        .chunks(2)
        .map(|pair| parse_card(&String::from_utf8_lossy(pair)))
        .collect()
}

/// Parses exactly two hole cards.
pub fn parse_hole(text: &str) -> AnalyticsResult<[Card; 2]> {
    let cards = parse_board(text)?;
    match cards.as_slice() {
        [a, b] => Ok([*a, *b]),
        _ => Err(AnalyticsError::InvalidHandSize),
    }
}

/// Space-separated canonical rendering (`Ah Kd 7c`).
pub fn format_cards(cards: &[Card]) -> String {
    cards.iter().map(|c| c.to_string()).join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suit_first_and_rank_first_agree() {
        assert_eq!(parse_card("HA").unwrap(), parse_card("Ah").unwrap());
        assert_eq!(parse_card("d10").unwrap(), parse_card("Td").unwrap());
    }

    #[test]
    fn test_malformed_token_rejects_all() {
        assert!(parse_cards("Ah Kd X9").is_err());
        assert!(parse_cards("Ah Kdd").is_err());
    }

    #[test]
    fn test_empty_text_is_empty_board() {
        assert!(parse_cards("   ").unwrap().is_empty());
    }
}
