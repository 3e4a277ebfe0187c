//! Response matrix: bet events folded into per-scenario, per-bucket counters.
//!
//! [`ResponseMatrix`] is a plain value with an associative, commutative
//! [`ResponseMatrix::merge`], so per-worker matrices can be combined in any
//! order and the result equals a sequential fold over the same events.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::buckets::BUCKET_METADATA;
use crate::history::Street;
use crate::position::SeatPosition;
use crate::walker::{BetClass, BetEvent, ResponseKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub events: u64,
    pub fold_events: u64,
    pub call_events: u64,
    pub raise_events: u64,
}

impl Counters {
    pub fn add(&mut self, other: &Counters) {
        self.events += other.events;
        self.fold_events += other.fold_events;
        self.call_events += other.call_events;
        self.raise_events += other.raise_events;
    }

    /// One event plus one tally per recorded response.
    pub fn register(&mut self, event: &BetEvent) {
        self.events += 1;
        for response in &event.responses {
            match response.kind {
                ResponseKind::Fold => self.fold_events += 1,
                ResponseKind::Call => self.call_events += 1,
                ResponseKind::Raise => self.raise_events += 1,
            }
        }
    }

    pub fn responses(&self) -> u64 {
        self.fold_events + self.call_events + self.raise_events
    }

    pub fn fold_pct(&self) -> f64 {
        pct(self.fold_events, self.responses())
    }

    pub fn call_pct(&self) -> f64 {
        pct(self.call_events, self.responses())
    }

    pub fn raise_pct(&self) -> f64 {
        pct(self.raise_events, self.responses())
    }
}

fn pct(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScenarioKey {
    pub street: Street,
    pub position: SeatPosition,
    pub bet_class: BetClass,
    pub in_position: bool,
    pub player_count: usize,
}

impl ScenarioKey {
    pub fn of(event: &BetEvent) -> ScenarioKey {
        ScenarioKey {
            street: event.street,
            position: event.position,
            bet_class: event.bet_class,
            in_position: event.in_position,
            player_count: event.player_count,
        }
    }

    // Display order: street, position (UNKNOWN last), bet class, IP first, player count.
    fn sort_key(&self) -> (Street, usize, BetClass, bool, usize) {
        (self.street, self.position.order(), self.bet_class, !self.in_position, self.player_count)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMatrix {
    pub scenarios: BTreeMap<ScenarioKey, BTreeMap<&'static str, Counters>>,
}

impl ResponseMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one event. Events without a bucket are left out.
    pub fn add(&mut self, event: &BetEvent) {
        let Some(bucket) = event.matrix_bucket_key() else {
            log::debug!("hand {}: ratio {} has no bucket", event.hand_id, event.ratio);
            return;
        };
        self.scenarios
            .entry(ScenarioKey::of(event))
            .or_default()
            .entry(bucket)
            .or_default()
            .register(event);
    }

    pub fn extend<'a>(&mut self, events: impl IntoIterator<Item = &'a BetEvent>) {
        for event in events {
            self.add(event);
        }
    }

    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a BetEvent>) -> Self {
        let mut matrix = Self::new();
        matrix.extend(events);
        matrix
    }

    pub fn merge(mut self, other: ResponseMatrix) -> ResponseMatrix {
        for (key, buckets) in other.scenarios {
            let target = self.scenarios.entry(key).or_default();
            for (bucket, counters) in buckets {
                target.entry(bucket).or_default().add(&counters);
            }
        }
        self
    }

    pub fn get(&self, key: &ScenarioKey, bucket: &str) -> Counters {
        self.scenarios
            .get(key)
            .and_then(|b| b.get(bucket))
            .copied()
            .unwrap_or_default()
    }

    pub fn total(&self) -> Counters {
        let mut total = Counters::default();
        for counters in self.scenarios.values().flat_map(|b| b.values()) {
            total.add(counters);
        }
        total
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn to_payload(&self) -> MatrixPayload {
        let mut keys: Vec<&ScenarioKey> = self.scenarios.keys().collect();
        keys.sort_by_key(|k| k.sort_key());

        let scenarios = keys
            .into_iter()
            .map(|key| {
                let buckets = &self.scenarios[key];
                MatrixScenario {
                    street: key.street.as_str().to_string(),
                    hero_position: key.position.label().to_string(),
                    bet_type: key.bet_class.key().to_string(),
                    position: if key.in_position { "IP" } else { "OOP" }.to_string(),
                    player_count: key.player_count,
                    metrics: BUCKET_METADATA
                        .iter()
                        .map(|meta| {
                            let c = buckets.get(meta.key).copied().unwrap_or_default();
                            BucketMetrics {
                                bucket_key: meta.key.to_string(),
                                bucket_label: meta.label.to_string(),
                                events: c.events,
                                fold_events: c.fold_events,
                                call_events: c.call_events,
                                raise_events: c.raise_events,
                            }
                        })
                        .collect(),
                }
            })
            .collect();

        let player_counts: BTreeSet<usize> = self.scenarios.keys().map(|k| k.player_count).collect();
        let mut hero_positions: Vec<SeatPosition> = self
            .scenarios
            .keys()
            .map(|k| k.position)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        hero_positions.sort_by_key(|p| p.order());

        MatrixPayload {
            bucket_order: BUCKET_METADATA
                .iter()
                .map(|m| KeyLabel { key: m.key.to_string(), label: m.label.to_string() })
                .collect(),
            bet_types: BetClass::ALL
                .iter()
                .map(|c| KeyLabel { key: c.key().to_string(), label: c.label().to_string() })
                .collect(),
            positions: vec![
                KeyLabel { key: "IP".into(), label: "In Position".into() },
                KeyLabel { key: "OOP".into(), label: "Out of Position".into() },
            ],
            player_counts: player_counts.into_iter().collect(),
            hero_positions: hero_positions.iter().map(|p| p.label().to_string()).collect(),
            scenarios,
        }
    }
}

// ---------------------------------------------------------------------------
// Serialized payload
// ---------------------------------------------------------------------------

/// Key and display label pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyLabel {
    pub key: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketMetrics {
    pub bucket_key: String,
    pub bucket_label: String,
    pub events: u64,
    pub fold_events: u64,
    pub call_events: u64,
    pub raise_events: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixScenario {
    pub street: String,
    pub hero_position: String,
    pub bet_type: String,
    pub position: String,
    pub player_count: usize,
    pub metrics: Vec<BucketMetrics>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixPayload {
    pub bucket_order: Vec<KeyLabel>,
    pub bet_types: Vec<KeyLabel>,
    pub positions: Vec<KeyLabel>,
    pub player_counts: Vec<usize>,
    pub hero_positions: Vec<String>,
    pub scenarios: Vec<MatrixScenario>,
}
