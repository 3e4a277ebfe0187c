//! Batch processing over a JSON Lines hand source.
//!
//! Hands are independent, so every analysis bridges the line iterator onto
//! the rayon pool, builds a per-worker accumulator with `fold`, and combines
//! the workers with `reduce` over [`Merge`]. Aggregates are written to the
//! cache directory as derived artifacts that can always be rebuilt.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::time::Instant;

use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::aggregate::{MatrixPayload, ResponseMatrix};
use crate::config::{DataPaths, RunOptions, WalkerConfig};
use crate::curves::{preflop_samples, CurveScenario, ResponseCurves};
use crate::error::AnalyticsResult;
use crate::history::HandHistory;
use crate::position::SeatPosition;
use crate::scenario::{detect, ScenarioDescriptor, ScenarioSummary};
use crate::walker::{walk, SkipReason};

// ---------------------------------------------------------------------------
// Accumulators
// ---------------------------------------------------------------------------

/// Associative combination of two partial results.
pub trait Merge: Sized {
    fn merge(self, other: Self) -> Self;
}

impl Merge for ResponseMatrix {
    fn merge(self, other: Self) -> Self {
        ResponseMatrix::merge(self, other)
    }
}

impl Merge for ResponseCurves {
    fn merge(self, other: Self) -> Self {
        ResponseCurves::merge(self, other)
    }
}

impl Merge for ScenarioSummary {
    fn merge(self, other: Self) -> Self {
        ScenarioSummary::merge(self, other)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub hands_read: u64,
    pub hands_used: u64,
    pub records: u64,
    pub skipped: BTreeMap<SkipReason, u64>,
}

impl BatchStats {
    pub fn skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_insert(0) += 1;
    }

    pub fn skipped_total(&self) -> u64 {
        self.skipped.values().sum()
    }
}

impl Merge for BatchStats {
    fn merge(mut self, other: Self) -> Self {
        self.hands_read += other.hands_read;
        self.hands_used += other.hands_used;
        self.records += other.records;
        for (reason, n) in other.skipped {
            *self.skipped.entry(reason).or_insert(0) += n;
        }
        self
    }
}

/// Dealt-player positions across hands, with `UNKNOWN` as its own row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionCounts {
    pub hero: BTreeMap<SeatPosition, u64>,
    pub all: BTreeMap<SeatPosition, u64>,
}

impl Merge for PositionCounts {
    fn merge(mut self, other: Self) -> Self {
        for (p, n) in other.hero {
            *self.hero.entry(p).or_insert(0) += n;
        }
        for (p, n) in other.all {
            *self.all.entry(p).or_insert(0) += n;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Source
// ---------------------------------------------------------------------------

/// Non-blank lines of the source, capped at `max_hands`.
pub fn read_lines(path: &Path, max_hands: Option<usize>) -> AnalyticsResult<impl Iterator<Item = String> + Send> {
    let file = File::open(path)?;
    let lines = BufReader::new(file)
        .lines()
        .filter_map(|line| match line {
            Ok(l) => Some(l),
            Err(e) => {
                log::warn!("stopping at unreadable line: {}", e);
                None
            }
        })
        .filter(|l| !l.trim().is_empty())
        .take(max_hands.unwrap_or(usize::MAX));
    Ok(lines)
}

pub fn parse_hand(line: &str) -> Result<HandHistory, SkipReason> {
    HandHistory::from_json(line).map_err(|e| {
        log::debug!("skipping record: {}", e);
        SkipReason::Unparsable
    })
}

/// Runs `per_hand` over every hand in parallel. `per_hand` returns how many
/// records it added, or why the hand was skipped.
pub fn fold_hands<I, A, F>(lines: I, per_hand: F) -> (A, BatchStats)
where
    I: Iterator<Item = String> + Send,
    A: Default + Merge + Send,
    F: Fn(&HandHistory, &mut A) -> Result<usize, SkipReason> + Sync + Send,
{
    lines
        .par_bridge()
        .fold(
            || (A::default(), BatchStats::default()),
            |(mut acc, mut stats), line| {
                stats.hands_read += 1;
                match parse_hand(&line).and_then(|hand| per_hand(&hand, &mut acc)) {
                    Ok(records) => {
                        stats.hands_used += 1;
                        stats.records += records as u64;
                    }
                    Err(reason) => {
                        log::debug!("hand skipped: {}", reason);
                        stats.skip(reason);
                    }
                }
                (acc, stats)
            },
        )
        .reduce(
            || (A::default(), BatchStats::default()),
            |(a, sa), (b, sb)| (a.merge(b), sa.merge(sb)),
        )
}

// ---------------------------------------------------------------------------
// Analyses
// ---------------------------------------------------------------------------

pub fn build_matrix<I>(lines: I, config: &WalkerConfig) -> (ResponseMatrix, BatchStats)
where
    I: Iterator<Item = String> + Send,
{
    fold_hands(lines, |hand, matrix: &mut ResponseMatrix| {
        let walked = walk(hand, config)?;
        matrix.extend(&walked.events);
        Ok(walked.events.len())
    })
}

pub fn build_curves<I>(lines: I, config: &WalkerConfig) -> (ResponseCurves, BatchStats)
where
    I: Iterator<Item = String> + Send,
{
    fold_hands(lines, |hand, curves: &mut ResponseCurves| {
        let samples = preflop_samples(hand, config)?;
        for sample in &samples {
            curves.add(sample);
        }
        Ok(samples.len())
    })
}

pub fn summarize_scenario<I>(
    lines: I,
    descriptor: &ScenarioDescriptor,
    config: &WalkerConfig,
) -> (ScenarioSummary, BatchStats)
where
    I: Iterator<Item = String> + Send,
{
    fold_hands(lines, |hand, summary: &mut ScenarioSummary| {
        Ok(match detect(hand, descriptor, config)? {
            Some(attempt) => {
                summary.add(&attempt);
                1
            }
            None => 0,
        })
    })
}

pub fn position_distribution<I>(lines: I) -> (PositionCounts, BatchStats)
where
    I: Iterator<Item = String> + Send,
{
    fold_hands(lines, |hand, counts: &mut PositionCounts| {
        let positions = hand.positions();
        for position in positions.values() {
            *counts.all.entry(*position).or_insert(0) += 1;
        }
        if let Some(hero) = hand.hero.as_deref() {
            if let Some(position) = positions.get(hero) {
                *counts.hero.entry(*position).or_insert(0) += 1;
            }
        }
        Ok(positions.len())
    })
}

/// One line of the flat event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatEvent {
    pub hand_id: String,
    pub street: String,
    pub bettor: String,
    pub position: String,
    pub bet_class: String,
    pub ratio: f64,
    pub bucket_key: Option<String>,
    pub responder: Option<String>,
    pub response: Option<String>,
    pub ordinal: Option<usize>,
}

/// Streams one JSON line per response (or per unanswered bet) in source order.
pub fn write_events<I, W>(lines: I, config: &WalkerConfig, out: &mut W) -> AnalyticsResult<BatchStats>
where
    I: Iterator<Item = String>,
    W: Write,
{
    let mut stats = BatchStats::default();
    for line in lines {
        stats.hands_read += 1;
        let walked = match parse_hand(&line).and_then(|hand| walk(&hand, config)) {
            Ok(w) => w,
            Err(reason) => {
                stats.skip(reason);
                continue;
            }
        };
        stats.hands_used += 1;
        for event in &walked.events {
            let base = FlatEvent {
                hand_id: event.hand_id.clone(),
                street: event.street.as_str().to_string(),
                bettor: event.actor.clone(),
                position: event.position.label().to_string(),
                bet_class: event.bet_class.key().to_string(),
                ratio: event.ratio,
                bucket_key: event.ratio_bucket_key().map(str::to_string),
                responder: None,
                response: None,
                ordinal: None,
            };
            if event.responses.is_empty() {
                write_json_line(out, &base)?;
                stats.records += 1;
            }
            for response in &event.responses {
                let record = FlatEvent {
                    responder: Some(response.responder.clone()),
                    response: Some(response.kind.as_str().to_string()),
                    ordinal: Some(response.ordinal),
                    ..base.clone()
                };
                write_json_line(out, &record)?;
                stats.records += 1;
            }
        }
    }
    out.flush()?;
    Ok(stats)
}

fn write_json_line<W: Write, T: Serialize>(out: &mut W, value: &T) -> AnalyticsResult<()> {
    serde_json::to_writer(&mut *out, value)?;
    out.write_all(b"\n")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Where a payload came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    Cache,
    Built(BatchStats),
}

fn load_cached<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let json = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&json) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("ignoring unreadable cache {}: {}", path.display(), e);
            None
        }
    }
}

fn save_cache<T: Serialize>(path: &Path, value: &T) -> AnalyticsResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn load_or_build<T, B>(path: &Path, force: bool, build: B) -> AnalyticsResult<(T, Provenance)>
where
    T: Serialize + DeserializeOwned,
    B: FnOnce() -> AnalyticsResult<(T, BatchStats)>,
{
    if !force {
        if let Some(value) = load_cached(path) {
            log::info!("loaded cached payload from {}", path.display());
            return Ok((value, Provenance::Cache));
        }
    }
    let start = Instant::now();
    let (value, stats) = build()?;
    save_cache(path, &value)?;
    log::info!(
        "built {} from {} hands ({} used, {} skipped) in {:.1}s",
        path.display(),
        stats.hands_read,
        stats.hands_used,
        stats.skipped_total(),
        start.elapsed().as_secs_f64(),
    );
    Ok((value, Provenance::Built(stats)))
}

/// Flop response matrix payload, from cache unless `force` is set.
pub fn load_or_build_matrix(
    source: &Path,
    paths: &DataPaths,
    options: &RunOptions,
    config: &WalkerConfig,
) -> AnalyticsResult<(MatrixPayload, Provenance)> {
    let path = paths.output_for(options, &config.matrix_cache_file());
    load_or_build(&path, options.force, || {
        let (matrix, stats) = build_matrix(read_lines(source, options.max_hands)?, config);
        Ok((matrix.to_payload(), stats))
    })
}

pub fn load_or_build_curves(
    source: &Path,
    paths: &DataPaths,
    options: &RunOptions,
    config: &WalkerConfig,
) -> AnalyticsResult<(Vec<CurveScenario>, Provenance)> {
    let path = paths.output_for(options, &config.curves_cache_file());
    load_or_build(&path, options.force, || {
        let (curves, stats) = build_curves(read_lines(source, options.max_hands)?, config);
        Ok((curves.build(), stats))
    })
}
