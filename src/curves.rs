//! Preflop response curves: how the rest of the table answers a raise of a
//! given size, split by raiser position, stack depth, pot size and the number
//! of players already in and still to act.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::buckets::{bucket_index, bucket_pot, bucket_ratio, bucket_stack, Bucket, POT_BUCKETS, RATIO_BUCKETS, STACK_BUCKETS};
use crate::config::WalkerConfig;
use crate::history::{Action, ActionKind, HandHistory, Street};
use crate::position::SeatPosition;
use crate::walker::{admit, position_of, ResponseKind, SkipReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Situation {
    FoldedToHero,
    FacingLimpers,
    FacingSingleRaise,
    FacingRaiseWithCallers,
    FacingThreeBet,
}

impl Situation {
    pub fn classify(raise_count: usize, calls_since_raise: usize, calls_total: usize) -> Situation {
        match raise_count {
            0 if calls_total > 0 => Situation::FacingLimpers,
            0 => Situation::FoldedToHero,
            1 if calls_since_raise == 0 => Situation::FacingSingleRaise,
            1 => Situation::FacingRaiseWithCallers,
            _ => Situation::FacingThreeBet,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Situation::FoldedToHero => "folded_to_hero",
            Situation::FacingLimpers => "facing_limpers",
            Situation::FacingSingleRaise => "facing_single_raise",
            Situation::FacingRaiseWithCallers => "facing_raise_with_callers",
            Situation::FacingThreeBet => "facing_three_bet",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Situation::FoldedToHero => "Folded to hero (no raises yet)",
            Situation::FacingLimpers => "Facing one or more limpers",
            Situation::FacingSingleRaise => "Facing open raise",
            Situation::FacingRaiseWithCallers => "Facing raise with callers",
            Situation::FacingThreeBet => "Facing 3-bet after raising",
        }
    }
}

impl fmt::Display for Situation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// One preflop raise by an actor of interest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveSample {
    pub position: SeatPosition,
    pub stack_bucket: &'static str,
    pub pot_bucket: &'static str,
    pub ratio_bucket: &'static str,
    pub situation: Situation,
    pub response: ResponseKind,
    pub pot_before_bb: f64,
    pub invest_bb: f64,
    pub effective_stack_bb: f64,
    pub vpip_ahead: usize,
    pub players_behind: usize,
    pub final_pot_bb: f64,
    pub final_players: usize,
}

/// Extracts curve samples from one hand's blinds and preflop actions.
pub fn preflop_samples(hand: &HandHistory, config: &WalkerConfig) -> Result<Vec<CurveSample>, SkipReason> {
    let big_blind = admit(hand, config)?;
    let positions = hand.positions();
    let actions: Vec<&Action> = hand
        .actions
        .iter()
        .filter(|a| a.street <= Street::Preflop)
        .collect();

    let mut pot = 0.0;
    let mut contributed: BTreeMap<&str, f64> = BTreeMap::new();
    let mut folded: BTreeSet<&str> = BTreeSet::new();
    let mut vpip: BTreeSet<&str> = BTreeSet::new();
    let mut raise_count = 0;
    let mut calls_since_raise = 0;
    let mut calls_total = 0;
    let mut pending: Vec<CurveSample> = Vec::new();

    for (idx, action) in actions.iter().enumerate() {
        let player = action.player.as_str();
        match action.kind {
            ActionKind::Fold => {
                folded.insert(player);
            }
            ActionKind::Call => {
                calls_since_raise += 1;
                calls_total += 1;
                vpip.insert(player);
            }
            ActionKind::Bet | ActionKind::Raise | ActionKind::AllIn if action.amount > 0.0 => {
                if config.actors.includes(hand, player) && pot > 0.0 {
                    let spot = RaiseSpot {
                        idx,
                        pot_before: pot,
                        big_blind,
                        position: position_of(&positions, player),
                        situation: Situation::classify(raise_count, calls_since_raise, calls_total),
                    };
                    pending.extend(sample_for(hand, &actions, &spot, &vpip));
                }
                raise_count += 1;
                calls_since_raise = 0;
                calls_total = 0;
                vpip.insert(player);
            }
            _ => {}
        }
        if action.amount > 0.0 {
            pot += action.amount;
            *contributed.entry(player).or_insert(0.0) += action.amount;
        }
    }

    let final_pot_bb = pot / big_blind;
    let final_players = contributed
        .iter()
        .filter(|(p, amount)| **amount > 0.0 && !folded.contains(*p))
        .count();
    for sample in &mut pending {
        sample.final_pot_bb = final_pot_bb;
        sample.final_players = final_players;
    }
    Ok(pending)
}

struct RaiseSpot {
    idx: usize,
    pot_before: f64,
    big_blind: f64,
    position: SeatPosition,
    situation: Situation,
}

fn sample_for(
    hand: &HandHistory,
    actions: &[&Action],
    spot: &RaiseSpot,
    vpip: &BTreeSet<&str>,
) -> Option<CurveSample> {
    let RaiseSpot { idx, pot_before, big_blind, .. } = *spot;
    let action = actions[idx];
    let player = action.player.as_str();

    let own_stack = hand.seat_of(player).map_or(0.0, |s| s.chips);
    let deepest_other = hand
        .seats
        .iter()
        .filter(|s| s.name != player && hand.is_dealt(&s.name))
        .map(|s| s.chips)
        .fold(0.0, f64::max);
    let villain_stack = if deepest_other > 0.0 { deepest_other } else { own_stack };
    let effective_stack_bb = own_stack.min(villain_stack) / big_blind;

    let stack_bucket = bucket_stack(effective_stack_bb)?;
    let ratio_bucket = bucket_ratio(action.amount / pot_before)?;
    let pot_before_bb = pot_before / big_blind;
    let pot_bucket = bucket_pot(pot_before_bb)?;

    let later = &actions[idx + 1..];
    Some(CurveSample {
        position: spot.position,
        stack_bucket: stack_bucket.key,
        pot_bucket: pot_bucket.key,
        ratio_bucket: ratio_bucket.key,
        situation: spot.situation,
        response: first_response(later, player),
        pot_before_bb,
        invest_bb: action.amount / big_blind,
        effective_stack_bb,
        vpip_ahead: vpip.iter().filter(|p| **p != player).count(),
        players_behind: later
            .iter()
            .map(|a| a.player.as_str())
            .filter(|p| *p != player)
            .collect::<BTreeSet<_>>()
            .len(),
        final_pot_bb: 0.0,
        final_players: 0,
    })
}

// First call or raise by someone else before the raiser acts again.
fn first_response(later: &[&Action], raiser: &str) -> ResponseKind {
    for action in later {
        if action.kind.is_post() {
            continue;
        }
        if action.player == raiser {
            break;
        }
        match action.kind {
            ActionKind::Call => return ResponseKind::Call,
            kind if kind.is_aggressive() => return ResponseKind::Raise,
            _ => continue,
        }
    }
    ResponseKind::Fold
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CurveBucket {
    pub count: u64,
    pub fold_count: u64,
    pub call_count: u64,
    pub raise_count: u64,
    pub pot_sum_bb: f64,
    pub invest_sum_bb: f64,
    pub final_pot_sum_bb: f64,
    pub players_remaining_sum: f64,
}

impl CurveBucket {
    fn register(&mut self, sample: &CurveSample) {
        self.count += 1;
        self.pot_sum_bb += sample.pot_before_bb;
        self.invest_sum_bb += sample.invest_bb;
        self.final_pot_sum_bb += sample.final_pot_bb;
        self.players_remaining_sum += sample.final_players as f64;
        match sample.response {
            ResponseKind::Fold => self.fold_count += 1,
            ResponseKind::Call => self.call_count += 1,
            ResponseKind::Raise => self.raise_count += 1,
        }
    }

    fn add(&mut self, other: &CurveBucket) {
        self.count += other.count;
        self.fold_count += other.fold_count;
        self.call_count += other.call_count;
        self.raise_count += other.raise_count;
        self.pot_sum_bb += other.pot_sum_bb;
        self.invest_sum_bb += other.invest_sum_bb;
        self.final_pot_sum_bb += other.final_pot_sum_bb;
        self.players_remaining_sum += other.players_remaining_sum;
    }

    pub fn to_point(&self, bucket: &Bucket) -> Option<CurvePoint> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        let fold_pct = self.fold_count as f64 / n * 100.0;
        let call_pct = self.call_count as f64 / n * 100.0;
        let raise_pct = self.raise_count as f64 / n * 100.0;
        let avg_pot = self.pot_sum_bb / n;
        let avg_invest = self.invest_sum_bb / n;
        let continue_rate = (self.call_count + self.raise_count) as f64 / n;

        Some(CurvePoint {
            bucket_key: bucket.key.to_string(),
            bucket_label: bucket.label.to_string(),
            representative_ratio: bucket.representative(),
            fold_pct: round_to(fold_pct, 2),
            call_pct: round_to(call_pct, 2),
            raise_pct: round_to(raise_pct, 2),
            ev_bb: round_to(fold_pct / 100.0 * avg_pot - continue_rate * avg_invest, 3),
            expected_final_pot_bb: round_to(self.final_pot_sum_bb / n, 3),
            expected_players_remaining: round_to(self.players_remaining_sum / n, 2),
        })
    }
}

fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CurveKey {
    pub position: SeatPosition,
    pub stack_bucket: &'static str,
    pub pot_bucket: &'static str,
    pub vpip_ahead: usize,
    pub players_behind: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct CurveAggregate {
    samples: u64,
    effective_stack_sum_bb: f64,
    pot_before_sum_bb: f64,
    situations: BTreeMap<Situation, u64>,
    buckets: BTreeMap<&'static str, CurveBucket>,
}

impl CurveAggregate {
    fn add(&mut self, other: &CurveAggregate) {
        self.samples += other.samples;
        self.effective_stack_sum_bb += other.effective_stack_sum_bb;
        self.pot_before_sum_bb += other.pot_before_sum_bb;
        for (situation, n) in &other.situations {
            *self.situations.entry(*situation).or_insert(0) += n;
        }
        for (key, bucket) in &other.buckets {
            self.buckets.entry(key).or_default().add(bucket);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseCurves {
    scenarios: BTreeMap<CurveKey, CurveAggregate>,
}

impl ResponseCurves {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, sample: &CurveSample) {
        let key = CurveKey {
            position: sample.position,
            stack_bucket: sample.stack_bucket,
            pot_bucket: sample.pot_bucket,
            vpip_ahead: sample.vpip_ahead,
            players_behind: sample.players_behind,
        };
        let agg = self.scenarios.entry(key).or_default();
        agg.samples += 1;
        agg.effective_stack_sum_bb += sample.effective_stack_bb;
        agg.pot_before_sum_bb += sample.pot_before_bb;
        *agg.situations.entry(sample.situation).or_insert(0) += 1;
        agg.buckets.entry(sample.ratio_bucket).or_default().register(sample);
    }

    pub fn merge(mut self, other: ResponseCurves) -> ResponseCurves {
        for (key, agg) in &other.scenarios {
            self.scenarios.entry(*key).or_default().add(agg);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Scenarios sorted by position, then stack and pot bucket order, then vpip ahead and players behind.
    pub fn build(&self) -> Vec<CurveScenario> {
        let mut keys: Vec<&CurveKey> = self.scenarios.keys().collect();
        keys.sort_by_key(|k| {
            (
                k.position.order(),
                bucket_index(&STACK_BUCKETS, k.stack_bucket),
                bucket_index(&POT_BUCKETS, k.pot_bucket),
                k.vpip_ahead,
                k.players_behind,
            )
        });
        keys.into_iter()
            .filter_map(|key| to_scenario(key, &self.scenarios[key]))
            .collect()
    }
}

fn to_scenario(key: &CurveKey, agg: &CurveAggregate) -> Option<CurveScenario> {
    if agg.samples == 0 {
        return None;
    }
    let points: Vec<CurvePoint> = RATIO_BUCKETS
        .iter()
        .filter_map(|bucket| agg.buckets.get(bucket.key).and_then(|b| b.to_point(bucket)))
        .collect();
    if points.is_empty() {
        return None;
    }

    // Most frequent situation; ties go to the earlier situation.
    let situation = agg
        .situations
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .map(|(s, _)| *s);

    let n = agg.samples as f64;
    let position_label = key.position.label().to_lowercase();
    Some(CurveScenario {
        id: format!(
            "{}_{}_{}_vpip{}_behind{}",
            position_label, key.stack_bucket, key.pot_bucket, key.vpip_ahead, key.players_behind
        ),
        hero_position: key.position.label().to_string(),
        villain_profile: "Population".to_string(),
        stack_bucket_key: key.stack_bucket.to_string(),
        situation_key: situation.map(|s| s.key().to_string()).unwrap_or_default(),
        situation_label: situation.map(|s| s.label().to_string()).unwrap_or_default(),
        vpip_ahead: key.vpip_ahead,
        players_behind: key.players_behind,
        pot_bucket_key: key.pot_bucket.to_string(),
        pot_size_bb: round_to(agg.pot_before_sum_bb / n, 3),
        effective_stack_bb: round_to(agg.effective_stack_sum_bb / n, 3),
        sample_size: agg.samples,
        points,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub bucket_key: String,
    pub bucket_label: String,
    pub representative_ratio: f64,
    pub fold_pct: f64,
    pub call_pct: f64,
    pub raise_pct: f64,
    pub ev_bb: f64,
    pub expected_final_pot_bb: f64,
    pub expected_players_remaining: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveScenario {
    pub id: String,
    pub hero_position: String,
    pub villain_profile: String,
    pub stack_bucket_key: String,
    pub situation_key: String,
    pub situation_label: String,
    pub vpip_ahead: usize,
    pub players_behind: usize,
    pub pot_bucket_key: String,
    pub pot_size_bb: f64,
    pub effective_stack_bb: f64,
    pub sample_size: u64,
    pub points: Vec<CurvePoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_situation_keys() {
        assert_eq!(Situation::classify(0, 0, 0), Situation::FoldedToHero);
        assert_eq!(Situation::classify(0, 2, 2), Situation::FacingLimpers);
        assert_eq!(Situation::classify(1, 1, 1), Situation::FacingRaiseWithCallers);
        assert_eq!(Situation::classify(2, 0, 0), Situation::FacingThreeBet);
    }

    #[test]
    fn test_open_ended_bucket_point_sits_half_past_lower() {
        let bucket = CurveBucket { count: 1, fold_count: 1, pot_sum_bb: 1.5, invest_sum_bb: 5.0, ..Default::default() };
        let point = bucket.to_point(&RATIO_BUCKETS[8]).unwrap();
        assert_eq!(point.representative_ratio, 3.5);
        assert_eq!(point.ev_bb, 1.5);
    }
}
