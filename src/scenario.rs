//! Preflop scenario descriptors.
//!
//! Steals, opens, isolation raises, 3-bets, squeezes and 4-bets are all the
//! same question asked with different parameters: find the raise that comes
//! after exactly `prior_raises` raises, check who made it and how many players
//! called since the last raise, then record how everyone else answered.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::buckets::Bucket;
use crate::config::WalkerConfig;
use crate::error::{AnalyticsError, AnalyticsResult};
use crate::history::{ActionKind, HandHistory, Street};
use crate::position::{Position, SeatPosition};
use crate::walker::{admit, position_of, ResponseEvent, ResponseKind, SkipReason};

static SCENARIOS_JSON: &str = include_str!("../data/scenarios.json");

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ScenarioDescriptor {
    pub key: String,
    pub title: String,
    /// `None` accepts a raise from any position.
    pub position: Option<Position>,
    pub prior_raises: usize,
    pub min_prior_calls: usize,
    /// `None` leaves the number of callers unbounded.
    pub max_prior_calls: Option<usize>,
}

impl ScenarioDescriptor {
    pub fn accepts(&self, position: SeatPosition, calls_since_raise: usize) -> bool {
        let position_ok = match self.position {
            Some(required) => position == SeatPosition::Resolved(required),
            None => true,
        };
        position_ok
            && calls_since_raise >= self.min_prior_calls
            && self.max_prior_calls.map_or(true, |max| calls_since_raise <= max)
    }
}

#[derive(Deserialize, Debug)]
struct ScenarioFile {
    scenarios: Vec<ScenarioDescriptor>,
}

static BUILT_IN: Lazy<Vec<ScenarioDescriptor>> = Lazy::new(|| {
    let file: ScenarioFile = serde_json::from_str(SCENARIOS_JSON).expect("Failed to parse built-in scenarios");
    file.scenarios
});

pub fn builtin_scenarios() -> &'static [ScenarioDescriptor] {
    &BUILT_IN
}

pub fn find_scenario(key: &str) -> AnalyticsResult<&'static ScenarioDescriptor> {
    let wanted = key.trim().to_lowercase();
    BUILT_IN
        .iter()
        .find(|d| d.key == wanted)
        .ok_or_else(|| AnalyticsError::UnknownScenario(key.to_string()))
}

/// Raise-to sizes in big blinds.
pub static SIZE_BUCKETS: [Bucket; 6] = [
    Bucket::new("x1_5_2_0", "1.5-2.0x", 1.5, 2.0),
    Bucket::new("x2_0_2_2", "2.0-2.2x", 2.0, 2.2),
    Bucket::new("x2_2_2_5", "2.2-2.5x", 2.2, 2.5),
    Bucket::new("x2_5_2_7", "2.5-2.7x", 2.5, 2.7),
    Bucket::new("x2_7_3_0", "2.7-3.0x", 2.7, 3.0),
    Bucket::new("x3_0_plus", "3.0x+", 3.0, f64::INFINITY),
];

pub const OTHER_SIZE: &str = "other";

pub fn size_bucket(size_bb: f64) -> Option<&'static Bucket> {
    SIZE_BUCKETS.iter().find(|b| b.contains(size_bb))
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioAttempt {
    pub hand_id: String,
    pub scenario: String,
    pub actor: String,
    pub position: SeatPosition,
    /// Total the raiser put in this round, in big blinds.
    pub size_bb: f64,
    pub size_bucket: &'static str,
    pub responses: Vec<ResponseEvent>,
    pub success: bool,
}

/// Finds the descriptor's raise in one hand, if it happened.
pub fn detect(
    hand: &HandHistory,
    descriptor: &ScenarioDescriptor,
    config: &WalkerConfig,
) -> Result<Option<ScenarioAttempt>, SkipReason> {
    let big_blind = admit(hand, config)?;
    let positions = hand.positions();
    let actions: Vec<_> = hand.actions.iter().filter(|a| a.street <= Street::Preflop).collect();

    let mut contributed: BTreeMap<&str, f64> = BTreeMap::new();
    let mut raises = 0;
    let mut calls_since_raise = 0;

    for (idx, action) in actions.iter().enumerate() {
        let player = action.player.as_str();
        match action.kind {
            ActionKind::Call => calls_since_raise += 1,
            kind if kind.is_aggressive() && action.amount > 0.0 => {
                if raises == descriptor.prior_raises {
                    let position = position_of(&positions, player);
                    if !descriptor.accepts(position, calls_since_raise) || !config.actors.includes(hand, player) {
                        return Ok(None);
                    }
                    let size_bb = (contributed.get(player).copied().unwrap_or(0.0) + action.amount) / big_blind;

                    let mut responses: Vec<ResponseEvent> = Vec::new();
                    for later in &actions[idx + 1..] {
                        if later.player == player || responses.iter().any(|r| r.responder == later.player) {
                            continue;
                        }
                        let Some(kind) = ResponseKind::from_action(later.kind) else { continue };
                        responses.push(ResponseEvent {
                            responder: later.player.clone(),
                            position: position_of(&positions, &later.player),
                            kind,
                            ordinal: responses.len() + 1,
                        });
                    }
                    let success = !responses.iter().any(|r| r.kind.continues());

                    return Ok(Some(ScenarioAttempt {
                        hand_id: hand.hand_id.clone(),
                        scenario: descriptor.key.clone(),
                        actor: player.to_string(),
                        position,
                        size_bb,
                        size_bucket: size_bucket(size_bb).map_or(OTHER_SIZE, |b| b.key),
                        responses,
                        success,
                    }));
                }
                raises += 1;
                calls_since_raise = 0;
            }
            _ => {}
        }
        if action.amount > 0.0 {
            *contributed.entry(player).or_insert(0.0) += action.amount;
        }
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeTally {
    pub attempts: u64,
    pub successes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScenarioSummary {
    pub attempts: u64,
    pub successes: u64,
    pub size_sum_bb: f64,
    pub by_size: BTreeMap<&'static str, SizeTally>,
}

impl ScenarioSummary {
    pub fn add(&mut self, attempt: &ScenarioAttempt) {
        self.attempts += 1;
        self.size_sum_bb += attempt.size_bb;
        let tally = self.by_size.entry(attempt.size_bucket).or_default();
        tally.attempts += 1;
        if attempt.success {
            self.successes += 1;
            tally.successes += 1;
        }
    }

    pub fn merge(mut self, other: ScenarioSummary) -> ScenarioSummary {
        self.attempts += other.attempts;
        self.successes += other.successes;
        self.size_sum_bb += other.size_sum_bb;
        for (key, tally) in other.by_size {
            let entry = self.by_size.entry(key).or_default();
            entry.attempts += tally.attempts;
            entry.successes += tally.successes;
        }
        self
    }

    pub fn average_size_bb(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.size_sum_bb / self.attempts as f64
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.successes as f64 / self.attempts as f64
        }
    }

    /// Size buckets in ascending order, with `other` last when present.
    pub fn size_rows(&self) -> Vec<(&'static str, SizeTally)> {
        let mut rows: Vec<(&'static str, SizeTally)> = SIZE_BUCKETS
            .iter()
            .filter_map(|b| self.by_size.get(b.key).map(|t| (b.label, *t)))
            .collect();
        if let Some(t) = self.by_size.get(OTHER_SIZE) {
            rows.push((OTHER_SIZE, *t));
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_parse() {
        let keys: Vec<&str> = builtin_scenarios().iter().map(|d| d.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["btn-steal", "co-open", "lj-open", "sb-open", "bb-iso", "three-bet", "squeeze", "four-bet"]
        );
        assert_eq!(find_scenario("SQUEEZE").unwrap().min_prior_calls, 1);
        assert!(find_scenario("limp-reraise").is_err());
    }

    #[test]
    fn test_squeeze_needs_a_caller() {
        let squeeze = find_scenario("squeeze").unwrap();
        assert!(!squeeze.accepts(SeatPosition::Resolved(Position::BB), 0));
        assert!(squeeze.accepts(SeatPosition::Unknown, 2));
    }
}
