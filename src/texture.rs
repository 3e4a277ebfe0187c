use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cards::{parse_board, Card};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureLabel {
    Rainbow,
    Monotone,
    TwoTone,
    Paired,
    Connected,
    AceHigh,
    Low,
    High,
}

impl TextureLabel {
    pub const ALL: [TextureLabel; 8] = [
        TextureLabel::Rainbow,
        TextureLabel::Monotone,
        TextureLabel::TwoTone,
        TextureLabel::Paired,
        TextureLabel::Connected,
        TextureLabel::AceHigh,
        TextureLabel::Low,
        TextureLabel::High,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            TextureLabel::Rainbow => "rainbow",
            TextureLabel::Monotone => "monotone",
            TextureLabel::TwoTone => "two_tone",
            TextureLabel::Paired => "paired",
            TextureLabel::Connected => "connected",
            TextureLabel::AceHigh => "ace_high",
            TextureLabel::Low => "low",
            TextureLabel::High => "high",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            TextureLabel::Rainbow => "Rainbow Flops",
            TextureLabel::Monotone => "Monotone Flops",
            TextureLabel::TwoTone => "Two-Tone Flops",
            TextureLabel::Paired => "Paired Flops",
            TextureLabel::Connected => "Connected Flops",
            TextureLabel::AceHigh => "Ace-High Flops",
            TextureLabel::Low => "Low Flops (All <= Ten)",
            TextureLabel::High => "High Flops (>=2 Broadways)",
        }
    }
}

impl fmt::Display for TextureLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Labels for a three card flop. Anything other than exactly three cards
/// yields an empty set rather than an error.
pub fn texture(board: &[Card]) -> BTreeSet<TextureLabel> {
    let mut labels = BTreeSet::new();
    if board.len() != 3 {
        return labels;
    }

    let mut suit_counts: HashMap<_, u32> = HashMap::new();
    for card in board {
        *suit_counts.entry(card.suit).or_insert(0) += 1;
    }
    match suit_counts.len() {
        3 => labels.insert(TextureLabel::Rainbow),
        2 => labels.insert(TextureLabel::TwoTone),
        _ => labels.insert(TextureLabel::Monotone),
    };

    let mut values: Vec<u8> = board.iter().map(|c| c.value()).collect();
    values.sort_unstable();

    if values.windows(2).any(|w| w[0] == w[1]) {
        labels.insert(TextureLabel::Paired);
    }
    if is_connected(&values) {
        labels.insert(TextureLabel::Connected);
    }
    if values[2] == 14 {
        labels.insert(TextureLabel::AceHigh);
    }
    if values.iter().all(|&v| v <= 10) {
        labels.insert(TextureLabel::Low);
    }
    if board.iter().filter(|c| c.rank.is_broadway()).count() >= 2 {
        labels.insert(TextureLabel::High);
    }

    labels
}

/// Texture of a board given as text. Unparsable text is treated like a
/// missing board.
pub fn texture_of(notation: &str) -> BTreeSet<TextureLabel> {
    match parse_board(notation) {
        Ok(cards) => texture(&cards),
        Err(_) => BTreeSet::new(),
    }
}

pub fn texture_keys(labels: &BTreeSet<TextureLabel>) -> Vec<String> {
    labels.iter().map(|l| l.key().to_string()).collect()
}

// Span of at most four, with the ace allowed to play low.
fn is_connected(sorted: &[u8]) -> bool {
    if sorted[2] - sorted[0] <= 4 {
        return true;
    }
    if sorted.contains(&14) {
        let mut wheel: Vec<u8> = sorted.iter().map(|&v| if v == 14 { 1 } else { v }).collect();
        wheel.sort_unstable();
        return wheel[2] - wheel[0] <= 4;
    }
    false
}
