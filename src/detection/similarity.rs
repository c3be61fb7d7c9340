//! Similar-trade matching: cross-account trades on one symbol opened and
//! closed within the time tolerance of each other.

use chrono::{DateTime, Duration, Utc};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::models::{sort_pairs, MatchRecord, TradeRecord};

use super::bucket::{BucketIndex, SpanKey};
use super::error::{validate_trades, DetectionResult};
use super::pairs::{self, CandidatePair};
use super::DetectionConfig;

/// Absolute difference between two instants.
fn abs_delta(a: DateTime<Utc>, b: DateTime<Utc>) -> Duration {
    if a >= b {
        a - b
    } else {
        b - a
    }
}

fn as_secs_f64(delta: Duration) -> f64 {
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => delta.num_seconds() as f64,
    }
}

/// Whether a candidate pair qualifies as similar trades.
pub fn is_similar(pair: &CandidatePair<'_>, tolerance: Duration) -> bool {
    pair.same_symbol()
        && !pair.same_account()
        && abs_delta(pair.first.opened_at, pair.second.opened_at) <= tolerance
        && abs_delta(pair.first.closed_at, pair.second.closed_at) <= tolerance
}

impl From<CandidatePair<'_>> for MatchRecord {
    fn from(pair: CandidatePair<'_>) -> Self {
        let (a, b) = (pair.first, pair.second);
        MatchRecord {
            symbol: a.symbol.clone(),
            trade_1: a.id,
            account_1: a.account.clone(),
            trade_2: b.id,
            account_2: b.account.clone(),
            opened_at_1: a.opened_at,
            opened_at_2: b.opened_at,
            closed_at_1: a.closed_at,
            closed_at_2: b.closed_at,
            open_diff_secs: as_secs_f64(abs_delta(a.opened_at, b.opened_at)),
            close_diff_secs: as_secs_f64(abs_delta(a.closed_at, b.closed_at)),
        }
    }
}

/// Find all similar trade pairs in the collection.
///
/// Ineligible trades (too small, or held too briefly) are dropped once up
/// front. Output is sorted by symbol, then trade ids.
pub fn find_similar_trades(
    trades: &[TradeRecord],
    config: &DetectionConfig,
) -> DetectionResult<Vec<MatchRecord>> {
    validate_trades(trades)?;

    let eligible: Vec<&TradeRecord> = trades.iter().filter(|t| config.is_eligible(t)).collect();
    let index = BucketIndex::by_span(eligible.iter().copied(), config.bucket_width());
    if index.is_empty() {
        info!(trades = trades.len(), "No eligible trades for similarity matching");
        return Ok(Vec::new());
    }
    let radius = config.neighbor_radius();
    let tolerance = config.time_tolerance();

    debug!(
        eligible = eligible.len(),
        buckets = index.len(),
        largest_bucket = index.max_bucket_size(),
        radius = radius,
        "Built similarity bucket index"
    );

    let scan = |key: &SpanKey| -> Vec<MatchRecord> {
        let Some(home) = index.get(key) else {
            return Vec::new();
        };
        let neighbors = index
            .neighbors_after(key, radius)
            .flat_map(|other| pairs::across(home, other));

        pairs::within(home)
            .chain(neighbors)
            .filter(|pair| is_similar(pair, tolerance))
            .map(MatchRecord::from)
            .collect()
    };

    let keys: Vec<&SpanKey> = index.keys().collect();
    let mut matches: Vec<MatchRecord> = if config.parallel {
        keys.par_iter().flat_map_iter(|&key| scan(key)).collect()
    } else {
        keys.iter().flat_map(|&key| scan(key)).collect()
    };
    sort_pairs(&mut matches);

    info!(
        trades = trades.len(),
        eligible = eligible.len(),
        matches = matches.len(),
        "Similar trade matching complete"
    );
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{BucketStrategy, DetectionError};
    use crate::models::{TradeAction, TradeId};
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    fn trade(id: u64, account: &str, open_ms: i64, close_ms: i64, lot: Decimal) -> TradeRecord {
        TradeRecord {
            id: TradeId(id),
            symbol: "EURUSD".to_string(),
            action: TradeAction::Buy,
            lot_size: lot,
            opened_at: base() + Duration::milliseconds(open_ms),
            closed_at: base() + Duration::milliseconds(close_ms),
            account: account.to_string(),
        }
    }

    #[test]
    fn test_end_to_end_example() {
        let trades = vec![
            trade(1, "U1", 0, 10_000, dec!(0.10)),
            trade(2, "U2", 60_000, 70_000, dec!(0.10)),
        ];
        let matches = find_similar_trades(&trades, &DetectionConfig::default()).unwrap();

        assert_eq!(matches.len(), 1);
        let m = &matches[0];
        assert_eq!(m.symbol, "EURUSD");
        assert_eq!((m.trade_1, m.trade_2), (TradeId(1), TradeId(2)));
        assert_eq!((m.account_1.as_str(), m.account_2.as_str()), ("U1", "U2"));
        assert_eq!(m.open_diff_secs, 60.0);
        assert_eq!(m.close_diff_secs, 60.0);
    }

    #[test]
    fn test_same_account_excluded() {
        let trades = vec![
            trade(1, "U1", 0, 10_000, dec!(0.10)),
            trade(2, "U1", 60_000, 70_000, dec!(0.10)),
        ];
        let matches = find_similar_trades(&trades, &DetectionConfig::default()).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let forward = vec![
            trade(1, "U1", 0, 10_000, dec!(0.10)),
            trade(2, "U2", 60_000, 70_000, dec!(0.10)),
            trade(3, "U3", 30_000, 50_000, dec!(0.20)),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let config = DetectionConfig::default();
        let a = find_similar_trades(&forward, &config).unwrap();
        let b = find_similar_trades(&reversed, &config).unwrap();

        assert_eq!(a.len(), 3);
        assert_eq!(a, b);
        assert!(a.iter().all(|m| m.trade_1 < m.trade_2));
    }

    #[test]
    fn test_eligibility_gate() {
        let trades = vec![
            trade(1, "U1", 0, 10_000, dec!(0.005)),
            trade(2, "U2", 0, 10_000, dec!(0.10)),
            // held for exactly one second
            trade(3, "U3", 0, 1_000, dec!(0.10)),
        ];
        let matches = find_similar_trades(&trades, &DetectionConfig::default()).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn test_time_window_boundary() {
        let config = DetectionConfig::default();

        let at_limit = vec![
            trade(1, "U1", 0, 10_000, dec!(0.10)),
            trade(2, "U2", 300_000, 310_000, dec!(0.10)),
        ];
        let matches = find_similar_trades(&at_limit, &config).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].open_diff_secs, 300.0);
        assert_eq!(matches[0].close_diff_secs, 300.0);

        let open_over = vec![
            trade(1, "U1", 0, 10_000, dec!(0.10)),
            trade(2, "U2", 300_010, 310_000, dec!(0.10)),
        ];
        assert!(find_similar_trades(&open_over, &config).unwrap().is_empty());

        let close_over = vec![
            trade(1, "U1", 0, 10_000, dec!(0.10)),
            trade(2, "U2", 300_000, 310_010, dec!(0.10)),
        ];
        assert!(find_similar_trades(&close_over, &config).unwrap().is_empty());
    }

    #[test]
    fn test_boundary_straddling_pair() {
        // Opens 2 seconds apart but on either side of a bucket boundary.
        let trades = vec![
            trade(1, "U1", 299_000, 320_000, dec!(0.10)),
            trade(2, "U2", 301_000, 322_000, dec!(0.10)),
        ];

        let neighborhood = find_similar_trades(&trades, &DetectionConfig::default()).unwrap();
        assert_eq!(neighborhood.len(), 1);

        let exact = DetectionConfig {
            bucket_strategy: BucketStrategy::Exact,
            ..Default::default()
        };
        assert!(find_similar_trades(&trades, &exact).unwrap().is_empty());
    }

    #[test]
    fn test_different_symbols_never_match() {
        let mut other = trade(2, "U2", 0, 10_000, dec!(0.10));
        other.symbol = "GBPUSD".to_string();
        let trades = vec![trade(1, "U1", 0, 10_000, dec!(0.10)), other];

        assert!(find_similar_trades(&trades, &DetectionConfig::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let trades: Vec<TradeRecord> = (0..60)
            .map(|i| {
                let open = (i as i64) * 45_000;
                trade(i + 1, &format!("U{}", i % 7), open, open + 120_000, dec!(0.10))
            })
            .collect();

        let sequential = find_similar_trades(&trades, &DetectionConfig::default()).unwrap();
        let parallel = find_similar_trades(
            &trades,
            &DetectionConfig {
                parallel: true,
                ..Default::default()
            },
        )
        .unwrap();

        assert!(!sequential.is_empty());
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_no_eligible_trades() {
        let trades = vec![
            trade(1, "U1", 0, 10_000, dec!(0.001)),
            trade(2, "U2", 0, 10_000, dec!(0.001)),
        ];
        assert!(find_similar_trades(&trades, &DetectionConfig::default())
            .unwrap()
            .is_empty());
        assert!(find_similar_trades(&[], &DetectionConfig::default())
            .unwrap()
            .is_empty());
    }

    /// xorshift64, reproducible across runs.
    fn next_rand(state: &mut u64) -> u64 {
        *state ^= *state << 13;
        *state ^= *state >> 7;
        *state ^= *state << 17;
        *state
    }

    /// Trades scattered over an hour around the epoch with millisecond offsets.
    fn scattered_trades(count: u64) -> Vec<TradeRecord> {
        let start = Utc.with_ymd_and_hms(1969, 12, 31, 23, 50, 0).unwrap();
        let mut state = 0x9E37_79B9_7F4A_7C15_u64;

        (1..=count)
            .map(|id| {
                let open_ms = (next_rand(&mut state) % 3_600_000) as i64;
                let hold_ms = 500 + (next_rand(&mut state) % 900_000) as i64;
                let symbol = if next_rand(&mut state) % 2 == 0 {
                    "EURUSD"
                } else {
                    "GBPUSD"
                };
                let opened_at = start + Duration::milliseconds(open_ms);
                TradeRecord {
                    id: TradeId(id),
                    symbol: symbol.to_string(),
                    action: TradeAction::Buy,
                    lot_size: dec!(0.10),
                    opened_at,
                    closed_at: opened_at + Duration::milliseconds(hold_ms),
                    account: format!("U{}", next_rand(&mut state) % 5),
                }
            })
            .collect()
    }

    /// Every pair checked directly, no bucketing.
    fn all_pairs_scan(trades: &[TradeRecord], config: &DetectionConfig) -> Vec<MatchRecord> {
        let tolerance = config.time_tolerance();
        let eligible: Vec<&TradeRecord> =
            trades.iter().filter(|t| config.is_eligible(t)).collect();
        let eligible = eligible.as_slice();

        let mut matches: Vec<MatchRecord> = eligible
            .iter()
            .enumerate()
            .flat_map(move |(i, &a)| eligible[i + 1..].iter().map(move |&b| (a, b)))
            .filter_map(|(a, b)| CandidatePair::new(a, b))
            .filter(|pair| is_similar(pair, tolerance))
            .map(MatchRecord::from)
            .collect();
        sort_pairs(&mut matches);
        matches
    }

    #[test]
    fn test_bucketing_finds_every_similar_pair() {
        let trades = scattered_trades(400);
        let configs = [
            DetectionConfig::default(),
            DetectionConfig {
                time_tolerance_secs: 601,
                ..Default::default()
            },
            DetectionConfig {
                bucket_width_secs: 70,
                parallel: true,
                ..Default::default()
            },
        ];

        for config in &configs {
            let expected = all_pairs_scan(&trades, config);
            let found = find_similar_trades(&trades, config).unwrap();

            assert!(!expected.is_empty());
            assert_eq!(found.len(), expected.len(), "radius {}", config.neighbor_radius());
            assert_eq!(found, expected);
        }
    }

    #[test]
    fn test_close_axis_straddling_pair() {
        // Same open bucket, closes 2 seconds apart across a bucket boundary.
        let trades = vec![
            trade(1, "U1", 10_000, 599_000, dec!(0.10)),
            trade(2, "U2", 20_000, 601_000, dec!(0.10)),
        ];

        let matches = find_similar_trades(&trades, &DetectionConfig::default()).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].close_diff_secs, 2.0);
    }

    #[test]
    fn test_negative_lot_fails_whole_call() {
        let trades = vec![
            trade(1, "U1", 0, 10_000, dec!(0.10)),
            trade(2, "U2", 0, 10_000, dec!(-0.10)),
        ];
        let err = find_similar_trades(&trades, &DetectionConfig::default()).unwrap_err();
        assert_eq!(
            err,
            DetectionError::InvalidLotSize {
                id: TradeId(2),
                lot: dec!(-0.10)
            }
        );
    }
}
