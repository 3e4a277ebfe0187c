//! Betting-round walker.
//!
//! One pass over a hand's actions, street by street. The pot carries across
//! streets while the per-street bookkeeping (who acted, whether a bet has been
//! made, the street's aggressor) is reset at every street boundary. On each
//! evaluated street the first bet by an actor of interest becomes a
//! [`BetEvent`], and every opponent's first action after it becomes a
//! [`ResponseEvent`].

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::buckets::{bucket_ratio, event_bucket_key, is_one_bb};
use crate::config::WalkerConfig;
use crate::hand_strength::{classify, HandClassification};
use crate::history::{Action, ActionKind, HandHistory, Street};
use crate::position::{postflop_rank, PositionMap, SeatPosition};
use crate::texture::{texture, TextureLabel};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetClass {
    Cbet,
    Donk,
    Stab,
}

impl BetClass {
    pub const ALL: [BetClass; 3] = [BetClass::Cbet, BetClass::Donk, BetClass::Stab];

    pub fn key(&self) -> &'static str {
        match self {
            BetClass::Cbet => "cbet",
            BetClass::Donk => "donk",
            BetClass::Stab => "stab",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BetClass::Cbet => "Continuation Bet",
            BetClass::Donk => "Donk Bet",
            BetClass::Stab => "Stab / Other",
        }
    }
}

impl fmt::Display for BetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    Fold,
    Call,
    Raise,
}

impl ResponseKind {
    /// Classifies an opponent's first action facing a bet. A check cannot
    /// continue against a bet and is counted as a fold. Posts are not responses.
    pub fn from_action(kind: ActionKind) -> Option<ResponseKind> {
        match kind {
            ActionKind::Fold | ActionKind::Check => Some(ResponseKind::Fold),
            ActionKind::Call => Some(ResponseKind::Call),
            ActionKind::Bet | ActionKind::Raise | ActionKind::AllIn => Some(ResponseKind::Raise),
            ActionKind::PostSmallBlind | ActionKind::PostBigBlind | ActionKind::Post => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseKind::Fold => "fold",
            ResponseKind::Call => "call",
            ResponseKind::Raise => "raise",
        }
    }

    pub fn continues(&self) -> bool {
        !matches!(self, ResponseKind::Fold)
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEvent {
    pub responder: String,
    pub position: SeatPosition,
    pub kind: ResponseKind,
    /// 1-based order among this bet's responses.
    pub ordinal: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetEvent {
    pub hand_id: String,
    pub street: Street,
    pub actor: String,
    pub position: SeatPosition,
    pub amount: f64,
    pub pot_before: f64,
    pub ratio: f64,
    pub bet_class: BetClass,
    /// Active players when the street opened.
    pub player_count: usize,
    pub in_position: bool,
    pub success: bool,
    pub is_all_in: bool,
    pub is_one_bb: bool,
    pub big_blind: f64,
    pub hand: Option<HandClassification>,
    pub flop_texture: BTreeSet<TextureLabel>,
    pub responses: Vec<ResponseEvent>,
}

impl BetEvent {
    pub fn ratio_bucket_key(&self) -> Option<&'static str> {
        bucket_ratio(self.ratio).map(|b| b.key)
    }

    /// Bucket used by the response matrix, honouring the all-in and one-bb
    /// special buckets.
    pub fn matrix_bucket_key(&self) -> Option<&'static str> {
        event_bucket_key(self.is_all_in, self.is_one_bb, self.ratio)
    }

    pub fn count(&self, kind: ResponseKind) -> usize {
        self.responses.iter().filter(|r| r.kind == kind).count()
    }
}

/// Why a whole hand produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingBigBlind,
    MissingHero,
    Unparsable,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MissingBigBlind => "missing big blind",
            SkipReason::MissingHero => "hero not dealt in",
            SkipReason::Unparsable => "unparsable record",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HandWalk {
    pub hand_id: String,
    pub big_blind: f64,
    pub positions: PositionMap,
    pub events: Vec<BetEvent>,
    pub final_pot: f64,
}

// ---------------------------------------------------------------------------
// Walker
// ---------------------------------------------------------------------------

/// Checks the preconditions shared by every per-hand analysis.
pub fn admit(hand: &HandHistory, config: &WalkerConfig) -> Result<f64, SkipReason> {
    let big_blind = match hand.big_blind {
        Some(bb) if bb > 0.0 && bb.is_finite() => bb,
        _ => return Err(SkipReason::MissingBigBlind),
    };
    if config.actors.needs_hero() {
        match hand.hero.as_deref() {
            Some(hero) if hand.is_dealt(hero) => {}
            _ => return Err(SkipReason::MissingHero),
        }
    }
    Ok(big_blind)
}

struct StreetState {
    street: Street,
    start_active: Vec<String>,
    acted: BTreeSet<String>,
    bet_seen: bool,
    aggressor: Option<String>,
    event: Option<BetEvent>,
    event_fired: bool,
}

impl StreetState {
    fn open(street: Street, active: &[String]) -> StreetState {
        StreetState {
            street,
            start_active: active.to_vec(),
            acted: BTreeSet::new(),
            bet_seen: false,
            aggressor: None,
            event: None,
            event_fired: false,
        }
    }
}

/// Walks one hand. Returns every bet event on the configured streets, or the
/// reason the whole hand was skipped.
pub fn walk(hand: &HandHistory, config: &WalkerConfig) -> Result<HandWalk, SkipReason> {
    let big_blind = admit(hand, config)?;
    let positions = hand.positions();
    let dealt_count = hand.dealt.len();
    let flop_texture = hand.board_at(Street::Flop).map(texture).unwrap_or_default();

    let mut pot = 0.0;
    let mut active: Vec<String> = hand.dealt.clone();
    let mut previous_aggressor: Option<String> = None;
    let mut events: Vec<BetEvent> = Vec::new();

    for street in [Street::Blinds, Street::Preflop, Street::Flop, Street::Turn, Street::River] {
        let mut state = StreetState::open(street, &active);
        let evaluate = config.evaluates(street) && state.start_active.len() >= 2;

        for action in hand.actions_on(street) {
            let pot_before = pot;

            if evaluate && !state.event_fired && !state.bet_seen && qualifies(hand, config, action) {
                state.event_fired = true;
                if pot_before > 0.0 {
                    let ctx = EventContext {
                        hand,
                        positions: &positions,
                        dealt_count,
                        big_blind,
                        flop_texture: &flop_texture,
                        previous_aggressor: previous_aggressor.as_deref(),
                    };
                    state.event = Some(open_event(&ctx, &state, action, pot_before));
                } else {
                    log::debug!("hand {}: dropping {} bet into an empty pot", hand.hand_id, street);
                }
            } else if let Some(event) = state.event.as_mut() {
                record_response(event, &positions, action);
            }

            if action.amount > 0.0 {
                pot += action.amount;
            }
            if action.kind == ActionKind::Fold {
                active.retain(|p| p != &action.player);
            }
            if action.kind.is_aggressive() && action.amount > 0.0 {
                state.bet_seen = true;
                state.aggressor = Some(action.player.clone());
            }
            state.acted.insert(action.player.clone());
        }

        if let Some(mut event) = state.event.take() {
            event.success = !event.responses.iter().any(|r| r.kind.continues());
            events.push(event);
        }
        if street != Street::Blinds {
            previous_aggressor = state.aggressor;
        }
    }

    Ok(HandWalk {
        hand_id: hand.hand_id.clone(),
        big_blind,
        positions,
        events,
        final_pot: pot,
    })
}

fn qualifies(hand: &HandHistory, config: &WalkerConfig, action: &Action) -> bool {
    action.kind.is_aggressive() && action.amount > 0.0 && config.actors.includes(hand, &action.player)
}

struct EventContext<'a> {
    hand: &'a HandHistory,
    positions: &'a PositionMap,
    dealt_count: usize,
    big_blind: f64,
    flop_texture: &'a BTreeSet<TextureLabel>,
    previous_aggressor: Option<&'a str>,
}

fn open_event(ctx: &EventContext<'_>, state: &StreetState, action: &Action, pot_before: f64) -> BetEvent {
    let actor = action.player.as_str();
    let bet_class = classify_bet(actor, ctx.previous_aggressor, &state.acted, &state.start_active);
    let in_position = in_position(actor, ctx.positions, &state.start_active, ctx.dealt_count);

    let hand_class = match (ctx.hand.hole(actor), ctx.hand.board_at(state.street)) {
        (Some(hole), Some(board)) => classify(hole, board).ok(),
        _ => None,
    };

    BetEvent {
        hand_id: ctx.hand.hand_id.clone(),
        street: state.street,
        actor: actor.to_string(),
        position: position_of(ctx.positions, actor),
        amount: action.amount,
        pot_before,
        ratio: action.amount / pot_before,
        bet_class,
        player_count: state.start_active.len(),
        in_position,
        success: true,
        is_all_in: action.kind == ActionKind::AllIn,
        is_one_bb: is_one_bb(action.amount, ctx.big_blind),
        big_blind: ctx.big_blind,
        hand: hand_class,
        flop_texture: ctx.flop_texture.clone(),
        responses: Vec::new(),
    }
}

fn record_response(event: &mut BetEvent, positions: &PositionMap, action: &Action) {
    if action.player == event.actor || event.responses.iter().any(|r| r.responder == action.player) {
        return;
    }
    let Some(kind) = ResponseKind::from_action(action.kind) else { return };
    let ordinal = event.responses.len() + 1;
    event.responses.push(ResponseEvent {
        responder: action.player.clone(),
        position: position_of(positions, &action.player),
        kind,
        ordinal,
    });
}

pub fn position_of(positions: &PositionMap, player: &str) -> SeatPosition {
    positions.get(player).copied().unwrap_or(SeatPosition::Unknown)
}

/// Continuation bet by the previous street's aggressor, donk bet into an
/// aggressor who is still in and has not acted yet, stab otherwise.
pub fn classify_bet(
    actor: &str,
    previous_aggressor: Option<&str>,
    acted: &BTreeSet<String>,
    start_active: &[String],
) -> BetClass {
    match previous_aggressor {
        Some(agg) if agg == actor => BetClass::Cbet,
        Some(agg) if start_active.iter().any(|p| p == agg) && !acted.contains(agg) => BetClass::Donk,
        _ => BetClass::Stab,
    }
}

/// True when the actor acts last postflop among the street's starting players.
pub fn in_position(actor: &str, positions: &PositionMap, start_active: &[String], dealt_count: usize) -> bool {
    let rank = |player: &str| {
        position_of(positions, player)
            .position()
            .map(|p| postflop_rank(p, dealt_count))
    };
    let Some(actor_rank) = rank(actor) else { return false };
    start_active
        .iter()
        .filter_map(|p| rank(p))
        .all(|r| r <= actor_rank)
}
