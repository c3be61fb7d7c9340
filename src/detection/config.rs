//! Detection configuration.

use std::fmt;

use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::models::TradeRecord;

/// Largest whole-second span `chrono::Duration::seconds` accepts.
const MAX_DURATION_SECS: i64 = i64::MAX / 1_000;

/// How candidate pairs are drawn from the bucket index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketStrategy {
    /// Pair trades within a bucket and with every neighbouring bucket in tolerance reach
    Neighborhood,
    /// Pair trades only within exactly equal buckets (misses boundary-straddling pairs)
    Exact,
}

impl fmt::Display for BucketStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketStrategy::Neighborhood => f.write_str("neighborhood"),
            BucketStrategy::Exact => f.write_str("exact"),
        }
    }
}

/// Configuration for matching and categorization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Maximum open-time and close-time difference for similar trades
    pub time_tolerance_secs: i64,

    /// Width of a time bucket
    pub bucket_width_secs: i64,

    /// Minimum lot size for a trade to take part in similarity matching
    pub min_lot_size: Decimal,

    /// Holding time must be strictly greater than this to take part in similarity matching
    pub min_duration_secs: i64,

    /// Size difference ratio below which a pair is a partial copy
    pub partial_copy_threshold: Decimal,

    /// Candidate generation strategy
    pub bucket_strategy: BucketStrategy,

    /// Process buckets on the rayon thread pool
    pub parallel: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            time_tolerance_secs: 300,         // 5 minutes
            bucket_width_secs: 300,           // 5 minute buckets
            min_lot_size: dec!(0.01),
            min_duration_secs: 1,
            partial_copy_threshold: dec!(0.3), // Within 30% of the larger lot
            bucket_strategy: BucketStrategy::Neighborhood,
            parallel: false,
        }
    }
}

impl DetectionConfig {
    pub fn time_tolerance(&self) -> Duration {
        Duration::seconds(self.tolerance_secs())
    }

    /// Tolerance clamped to what `chrono::Duration` can represent.
    fn tolerance_secs(&self) -> i64 {
        self.time_tolerance_secs.clamp(0, MAX_DURATION_SECS)
    }

    pub fn bucket_width(&self) -> i64 {
        self.bucket_width_secs.max(1)
    }

    /// How many buckets away (per axis) a similar trade can land.
    pub fn neighbor_radius(&self) -> i64 {
        match self.bucket_strategy {
            BucketStrategy::Exact => 0,
            BucketStrategy::Neighborhood => {
                let (tolerance, width) = (self.tolerance_secs(), self.bucket_width());
                tolerance / width + i64::from(tolerance % width != 0)
            }
        }
    }

    /// Whether a trade may take part in similarity matching.
    pub fn is_eligible(&self, trade: &TradeRecord) -> bool {
        let min_duration = self
            .min_duration_secs
            .clamp(-MAX_DURATION_SECS, MAX_DURATION_SECS);
        trade.lot_size >= self.min_lot_size && trade.duration() > Duration::seconds(min_duration)
    }
}
