//! Fixed interval buckets for bet-to-pot ratios, effective stacks and pot
//! sizes. Every interval is half-open `[lower, upper)` and the last one is
//! unbounded, so each list covers `[0, inf)` without overlap.

use once_cell::sync::Lazy;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bucket {
    pub key: &'static str,
    pub label: &'static str,
    pub lower: f64,
    pub upper: f64,
}

impl Bucket {
    pub const fn new(key: &'static str, label: &'static str, lower: f64, upper: f64) -> Bucket {
        Bucket { key, label, lower, upper }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value < self.upper
    }

    /// Point used to plot this bucket on a curve.
    pub fn representative(&self) -> f64 {
        if self.upper.is_finite() {
            (self.lower + self.upper) / 2.0
        } else {
            self.lower + 0.5
        }
    }
}

pub static RATIO_BUCKETS: [Bucket; 9] = [
    Bucket::new("pct_0_25", "0-25%", 0.00, 0.25),
    Bucket::new("pct_25_40", "25-40%", 0.25, 0.40),
    Bucket::new("pct_40_60", "40-60%", 0.40, 0.60),
    Bucket::new("pct_60_80", "60-80%", 0.60, 0.80),
    Bucket::new("pct_80_100", "80-100%", 0.80, 1.00),
    Bucket::new("pct_100_125", "100-125%", 1.00, 1.25),
    Bucket::new("pct_125_200", "125-200%", 1.25, 2.00),
    Bucket::new("pct_200_300", "200-300%", 2.00, 3.00),
    Bucket::new("pct_300_plus", "300%+", 3.00, f64::INFINITY),
];

pub static STACK_BUCKETS: [Bucket; 4] = [
    Bucket::new("bb_0_30", "0-30 bb", 0.0, 30.0),
    Bucket::new("bb_30_60", "30-60 bb", 30.0, 60.0),
    Bucket::new("bb_60_100", "60-100 bb", 60.0, 100.0),
    Bucket::new("bb_100_plus", "100+ bb", 100.0, f64::INFINITY),
];

pub static POT_BUCKETS: [Bucket; 5] = [
    Bucket::new("pot_blinds", "Blinds Only (~1.5 bb)", 0.0, 2.5),
    Bucket::new("pot_small", "2-4 bb", 2.5, 4.5),
    Bucket::new("pot_medium", "4-7 bb", 4.5, 7.5),
    Bucket::new("pot_large", "7-12 bb", 7.5, 12.5),
    Bucket::new("pot_huge", "12+ bb", 12.5, f64::INFINITY),
];

pub const ALL_IN_KEY: &str = "all_in";
pub const ONE_BB_KEY: &str = "one_bb";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BucketMeta {
    pub key: &'static str,
    pub label: &'static str,
}

/// Ratio buckets followed by the all-in and one-big-blind buckets.
pub static BUCKET_METADATA: Lazy<Vec<BucketMeta>> = Lazy::new(|| {
    RATIO_BUCKETS
        .iter()
        .map(|b| BucketMeta { key: b.key, label: b.label })
        .chain([
            BucketMeta { key: ALL_IN_KEY, label: "All-In" },
            BucketMeta { key: ONE_BB_KEY, label: "1 BB" },
        ])
        .collect()
});

fn bucket_in(list: &'static [Bucket], value: f64) -> Option<&'static Bucket> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    list.iter().find(|b| b.contains(value))
}

/// `None` for negative, NaN or infinite ratios.
pub fn bucket_ratio(ratio: f64) -> Option<&'static Bucket> {
    bucket_in(&RATIO_BUCKETS, ratio)
}

/// Effective stack in big blinds. A zero stack has no bucket.
pub fn bucket_stack(stack_bb: f64) -> Option<&'static Bucket> {
    if stack_bb <= 0.0 {
        return None;
    }
    bucket_in(&STACK_BUCKETS, stack_bb)
}

pub fn bucket_pot(pot_bb: f64) -> Option<&'static Bucket> {
    bucket_in(&POT_BUCKETS, pot_bb)
}

/// Position of `key` within `buckets`; unknown keys sort last.
pub fn bucket_index(buckets: &[Bucket], key: &str) -> usize {
    buckets.iter().position(|b| b.key == key).unwrap_or(buckets.len())
}

pub fn ratio_bucket_by_key(key: &str) -> Option<&'static Bucket> {
    RATIO_BUCKETS.iter().find(|b| b.key == key)
}

/// Tolerance when deciding whether a bet was exactly one big blind.
pub fn one_bb_tolerance(big_blind: f64) -> f64 {
    (big_blind * 1e-4).max(1e-6)
}

pub fn is_one_bb(amount: f64, big_blind: f64) -> bool {
    big_blind.is_finite() && (amount - big_blind).abs() <= one_bb_tolerance(big_blind)
}

/// Matrix bucket for a bet: all-in beats one big blind, which beats the ratio.
pub fn event_bucket_key(is_all_in: bool, is_one_bb: bool, ratio: f64) -> Option<&'static str> {
    if is_all_in {
        return Some(ALL_IN_KEY);
    }
    if is_one_bb {
        return Some(ONE_BB_KEY);
    }
    bucket_ratio(ratio).map(|b| b.key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_belong_to_upper_bucket() {
        assert_eq!(bucket_ratio(0.25).unwrap().key, "pct_25_40");
        assert_eq!(bucket_stack(30.0).unwrap().key, "bb_30_60");
        assert_eq!(bucket_pot(2.5).unwrap().key, "pot_small");
    }

    #[test]
    fn test_lists_are_contiguous() {
        for list in [&RATIO_BUCKETS[..], &STACK_BUCKETS[..], &POT_BUCKETS[..]] {
            assert_eq!(list[0].lower, 0.0);
            for pair in list.windows(2) {
                assert_eq!(pair[0].upper, pair[1].lower);
            }
            assert!(list[list.len() - 1].upper.is_infinite());
        }
    }
}
