//! Hand-history records and their normalised, read-only form.
//!
//! The source hands over one JSON object per line laid out like a DriveHUD
//! export: players with seats, then numbered rounds holding hole cards, board
//! cards and an ordered action list. [`HandHistory::from_record`] turns that
//! into typed actions, dropping only the pieces that fail to parse.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cards::{parse_board, parse_hole, Card};
use crate::error::AnalyticsResult;
use crate::position::{resolve, PositionMap, ResolveInput, Seat};

// ---------------------------------------------------------------------------
// Streets and action kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Street {
    Blinds,
    Preflop,
    Flop,
    Turn,
    River,
}

impl Street {
    pub const POSTFLOP: [Street; 3] = [Street::Flop, Street::Turn, Street::River];

    pub fn from_round(no: u8) -> Option<Street> {
        match no {
            0 => Some(Street::Blinds),
            1 => Some(Street::Preflop),
            2 => Some(Street::Flop),
            3 => Some(Street::Turn),
            4 => Some(Street::River),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Street::Blinds => "blinds",
            Street::Preflop => "preflop",
            Street::Flop => "flop",
            Street::Turn => "turn",
            Street::River => "river",
        }
    }

    pub fn from_str(s: &str) -> Option<Street> {
        match s.trim().to_lowercase().as_str() {
            "blinds" => Some(Street::Blinds),
            "preflop" | "pre-flop" => Some(Street::Preflop),
            "flop" => Some(Street::Flop),
            "turn" => Some(Street::Turn),
            "river" => Some(Street::River),
            _ => None,
        }
    }

    /// Board cards visible on this street.
    pub fn board_len(&self) -> usize {
        match self {
            Street::Blinds | Street::Preflop => 0,
            Street::Flop => 3,
            Street::Turn => 4,
            Street::River => 5,
        }
    }
}

impl fmt::Display for Street {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    PostSmallBlind,
    PostBigBlind,
    Post,
    Fold,
    Check,
    Call,
    Bet,
    Raise,
    AllIn,
}

impl ActionKind {
    /// DriveHUD action codes, or their lowercase names.
    pub fn from_code(code: &str) -> Option<ActionKind> {
        match code.trim().to_lowercase().as_str() {
            "0" | "fold" => Some(ActionKind::Fold),
            "1" | "sb" | "small_blind" => Some(ActionKind::PostSmallBlind),
            "2" | "bb" | "big_blind" => Some(ActionKind::PostBigBlind),
            "3" | "call" => Some(ActionKind::Call),
            "4" | "check" => Some(ActionKind::Check),
            "5" | "bet" => Some(ActionKind::Bet),
            "23" | "raise" => Some(ActionKind::Raise),
            "7" | "all-in" | "allin" | "all_in" => Some(ActionKind::AllIn),
            "post" | "ante" => Some(ActionKind::Post),
            _ => None,
        }
    }

    pub fn is_post(&self) -> bool {
        matches!(self, ActionKind::PostSmallBlind | ActionKind::PostBigBlind | ActionKind::Post)
    }

    pub fn is_aggressive(&self) -> bool {
        matches!(self, ActionKind::Bet | ActionKind::Raise | ActionKind::AllIn)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::PostSmallBlind => "post_sb",
            ActionKind::PostBigBlind => "post_bb",
            ActionKind::Post => "post",
            ActionKind::Fold => "fold",
            ActionKind::Check => "check",
            ActionKind::Call => "call",
            ActionKind::Bet => "bet",
            ActionKind::Raise => "raise",
            ActionKind::AllIn => "all-in",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub player: String,
    pub street: Street,
    pub kind: ActionKind,
    /// Chips put in by this action alone.
    pub amount: f64,
}

// ---------------------------------------------------------------------------
// Raw records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl RawValue {
    fn as_text(&self) -> String {
        match self {
            RawValue::Flag(b) => u8::from(*b).to_string(),
            RawValue::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            RawValue::Number(n) => n.to_string(),
            RawValue::Text(s) => s.trim().to_string(),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        let value = match self {
            RawValue::Flag(_) => return None,
            RawValue::Number(n) => *n,
            RawValue::Text(s) => s.trim().trim_start_matches('$').parse().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandRecord {
    pub hand_id: Option<RawValue>,
    #[serde(default)]
    pub hero: Option<String>,
    #[serde(default)]
    pub game_type: Option<String>,
    #[serde(default)]
    pub big_blind: Option<RawValue>,
    #[serde(default)]
    pub players: Vec<PlayerRecord>,
    #[serde(default)]
    pub rounds: Vec<RoundRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: Option<String>,
    pub seat: Option<RawValue>,
    #[serde(default)]
    pub dealer: Option<RawValue>,
    #[serde(default)]
    pub chips: Option<RawValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundRecord {
    pub no: u8,
    #[serde(default)]
    pub board: Option<String>,
    #[serde(default)]
    pub cards: Vec<HoleRecord>,
    #[serde(default)]
    pub actions: Vec<ActionRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HoleRecord {
    pub player: Option<String>,
    pub cards: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionRecord {
    pub player: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<RawValue>,
    #[serde(default)]
    pub sum: Option<RawValue>,
}

// ---------------------------------------------------------------------------
// Normalised hand
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct HandHistory {
    pub hand_id: String,
    pub hero: Option<String>,
    pub big_blind: Option<f64>,
    pub seats: Vec<Seat>,
    /// Players who received cards, in seat order.
    pub dealt: Vec<String>,
    pub hole_cards: HashMap<String, [Card; 2]>,
    /// Full board as far as the hand reached.
    pub board: Vec<Card>,
    /// Every action, rounds in order and actions in order within a round.
    pub actions: Vec<Action>,
}

impl HandHistory {
    pub fn from_record(record: HandRecord) -> HandHistory {
        let hand_id = record.hand_id.as_ref().map(RawValue::as_text).unwrap_or_default();

        let mut seats: Vec<Seat> = Vec::new();
        for player in &record.players {
            let (Some(name), Some(seat)) = (player.name.as_deref(), player.seat.as_ref().and_then(RawValue::as_f64))
            else {
                log::debug!("hand {}: dropping player entry without name or seat", hand_id);
                continue;
            };
            let dealer = player
                .dealer
                .as_ref()
                .map(|d| matches!(d.as_text().as_str(), "1" | "true"))
                .unwrap_or(false);
            let chips = player.chips.as_ref().and_then(RawValue::as_f64).unwrap_or(0.0).max(0.0);
            seats.push(Seat { name: name.trim().to_string(), seat: seat as u32, dealer, chips });
        }
        seats.sort_by_key(|s| s.seat);

        let mut rounds = record.rounds;
        rounds.sort_by_key(|r| r.no);

        let mut hole_cards: HashMap<String, [Card; 2]> = HashMap::new();
        let mut dealt_names: Vec<String> = Vec::new();
        let mut board: Vec<Card> = Vec::new();
        let mut actions: Vec<Action> = Vec::new();

        for round in &rounds {
            let Some(street) = Street::from_round(round.no) else {
                log::debug!("hand {}: ignoring round {}", hand_id, round.no);
                continue;
            };

            if street == Street::Preflop {
                for entry in &round.cards {
                    let Some(player) = entry.player.as_deref() else { continue };
                    dealt_names.push(player.trim().to_string());
                    match entry.cards.as_deref().map(parse_hole) {
                        Some(Ok(hole)) => {
                            hole_cards.insert(player.trim().to_string(), hole);
                        }
                        Some(Err(e)) => log::debug!("hand {}: hole cards for {}: {}", hand_id, player, e),
                        None => {}
                    }
                }
            }

            if let Some(text) = round.board.as_deref().filter(|t| !t.trim().is_empty()) {
                match parse_board(text) {
                    Ok(cards) => merge_board(&mut board, cards),
                    Err(e) => log::debug!("hand {}: board on {}: {}", hand_id, street, e),
                }
            }

            for raw in &round.actions {
                match normalise_action(raw, street) {
                    Some(action) => actions.push(action),
                    None => log::debug!("hand {}: skipping malformed action on {}", hand_id, street),
                }
            }
        }

        let dealt: Vec<String> = if dealt_names.is_empty() {
            seats.iter().map(|s| s.name.clone()).collect()
        } else {
            seats
                .iter()
                .filter(|s| dealt_names.contains(&s.name))
                .map(|s| s.name.clone())
                .collect()
        };

        let big_blind = extract_big_blind(
            record.big_blind.as_ref().and_then(RawValue::as_f64),
            record.game_type.as_deref(),
            &actions,
        );

        HandHistory {
            hand_id,
            hero: record.hero.map(|h| h.trim().to_string()).filter(|h| !h.is_empty()),
            big_blind,
            seats,
            dealt,
            hole_cards,
            board,
            actions,
        }
    }

    pub fn from_json(line: &str) -> AnalyticsResult<HandHistory> {
        let record: HandRecord = serde_json::from_str(line)?;
        Ok(HandHistory::from_record(record))
    }

    pub fn actions_on(&self, street: Street) -> impl Iterator<Item = &Action> {
        self.actions.iter().filter(move |a| a.street == street)
    }

    /// Board visible on `street`, or `None` if the hand never showed it.
    pub fn board_at(&self, street: Street) -> Option<&[Card]> {
        let len = street.board_len();
        (len > 0 && self.board.len() >= len).then(|| &self.board[..len])
    }

    pub fn hole(&self, player: &str) -> Option<&[Card; 2]> {
        self.hole_cards.get(player)
    }

    pub fn seat_of(&self, player: &str) -> Option<&Seat> {
        self.seats.iter().find(|s| s.name == player)
    }

    pub fn is_dealt(&self, player: &str) -> bool {
        self.dealt.iter().any(|d| d == player)
    }

    pub fn dealer_seat(&self) -> Option<u32> {
        self.seats.iter().find(|s| s.dealer).map(|s| s.seat)
    }

    fn first_poster(&self, kind: ActionKind) -> Option<&str> {
        self.actions
            .iter()
            .filter(|a| a.street <= Street::Preflop)
            .find(|a| a.kind == kind)
            .map(|a| a.player.as_str())
    }

    pub fn sb_poster(&self) -> Option<&str> {
        self.first_poster(ActionKind::PostSmallBlind)
    }

    pub fn bb_poster(&self) -> Option<&str> {
        self.first_poster(ActionKind::PostBigBlind)
    }

    /// Players in the order of their first non-posting action.
    pub fn first_action_order(&self) -> Vec<String> {
        let mut order: Vec<String> = Vec::new();
        for action in self.actions.iter().filter(|a| !a.kind.is_post()) {
            if !order.contains(&action.player) {
                order.push(action.player.clone());
            }
        }
        order
    }

    pub fn positions(&self) -> PositionMap {
        let action_order = self.first_action_order();
        resolve(&ResolveInput {
            seats: &self.seats,
            dealt: &self.dealt,
            sb_poster: self.sb_poster(),
            bb_poster: self.bb_poster(),
            dealer_seat: self.dealer_seat(),
            action_order: &action_order,
        })
    }
}

fn normalise_action(raw: &ActionRecord, street: Street) -> Option<Action> {
    let player = raw.player.as_deref().map(str::trim).filter(|p| !p.is_empty())?;
    let kind = ActionKind::from_code(&raw.kind.as_ref()?.as_text())?;
    let amount = raw.sum.as_ref().and_then(RawValue::as_f64).unwrap_or(0.0).max(0.0);
    Some(Action { player: player.to_string(), street, kind, amount })
}

// Rounds carry either just their new cards or the cumulative board.
fn merge_board(board: &mut Vec<Card>, cards: Vec<Card>) {
    if cards.len() > board.len() && cards.starts_with(board) {
        *board = cards;
    } else if !cards.iter().all(|c| board.contains(c)) {
        board.extend(cards);
    }
    board.truncate(5);
}

/// Big blind for a hand: a positive structured field wins, then the second
/// amount of an `a/b` stake in the game description, then the first big blind
/// post. `None` means the hand must be skipped.
pub fn extract_big_blind(field: Option<f64>, game_type: Option<&str>, actions: &[Action]) -> Option<f64> {
    if let Some(bb) = field.filter(|v| *v > 0.0) {
        return Some(bb);
    }
    if let Some(bb) = game_type.and_then(stake_big_blind) {
        return Some(bb);
    }
    actions
        .iter()
        .find(|a| a.kind == ActionKind::PostBigBlind && a.amount > 0.0)
        .map(|a| a.amount)
}

fn stake_big_blind(text: &str) -> Option<f64> {
    text.split_whitespace().find_map(|token| {
        let (_, big) = token.split_once('/')?;
        let digits: String = big
            .trim_start_matches('$')
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        digits.parse::<f64>().ok().filter(|v| *v > 0.0)
    })
}
