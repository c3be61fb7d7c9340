//! Bucketing index: groups trades per symbol into coarse time buckets.
//!
//! Bucketing only bounds how many candidate pairs get generated. The exact
//! pairwise predicates are always re-checked on the candidates.

use std::collections::BTreeMap;
use std::ops::Bound;

use chrono::{DateTime, Utc};

use crate::models::TradeRecord;

/// Index of the bucket containing `ts`, i.e. `floor(ts / width)`.
pub fn bucket_of(ts: DateTime<Utc>, width_secs: i64) -> i64 {
    ts.timestamp().div_euclid(width_secs)
}

/// Similarity key: symbol, open bucket, close bucket.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpanKey {
    pub symbol: String,
    pub open_bucket: i64,
    pub close_bucket: i64,
}

impl SpanKey {
    pub fn of(trade: &TradeRecord, width_secs: i64) -> Self {
        Self {
            symbol: trade.symbol.clone(),
            open_bucket: bucket_of(trade.opened_at, width_secs),
            close_bucket: bucket_of(trade.closed_at, width_secs),
        }
    }
}

/// Categorization key: symbol, open bucket.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OpenKey {
    pub symbol: String,
    pub open_bucket: i64,
}

impl OpenKey {
    pub fn of(trade: &TradeRecord, width_secs: i64) -> Self {
        Self {
            symbol: trade.symbol.clone(),
            open_bucket: bucket_of(trade.opened_at, width_secs),
        }
    }
}

/// Ordered mapping from bucket key to the trades sharing it, in input order.
pub struct BucketIndex<'a, K> {
    buckets: BTreeMap<K, Vec<&'a TradeRecord>>,
}

impl<'a, K: Ord> BucketIndex<'a, K> {
    pub fn build<I, F>(trades: I, key_of: F) -> Self
    where
        I: IntoIterator<Item = &'a TradeRecord>,
        F: Fn(&TradeRecord) -> K,
    {
        let mut buckets: BTreeMap<K, Vec<&'a TradeRecord>> = BTreeMap::new();
        for trade in trades {
            buckets.entry(key_of(trade)).or_default().push(trade);
        }
        Self { buckets }
    }

    pub fn get(&self, key: &K) -> Option<&[&'a TradeRecord]> {
        self.buckets.get(key).map(Vec::as_slice)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.buckets.keys()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Size of the largest bucket.
    pub fn max_bucket_size(&self) -> usize {
        self.buckets.values().map(Vec::len).max().unwrap_or(0)
    }
}

impl<'a> BucketIndex<'a, SpanKey> {
    pub fn by_span<I>(trades: I, width_secs: i64) -> Self
    where
        I: IntoIterator<Item = &'a TradeRecord>,
    {
        Self::build(trades, |t| SpanKey::of(t, width_secs))
    }

    /// Buckets sorting after `key` that lie within `radius` buckets of it on
    /// both axes.
    ///
    /// Visiting each key together with its later neighbours covers every pair
    /// of neighbouring buckets exactly once. Only keys present in the index are
    /// walked, so the cost does not grow with the radius.
    pub fn neighbors_after<'s>(
        &'s self,
        key: &'s SpanKey,
        radius: i64,
    ) -> impl Iterator<Item = &'s [&'a TradeRecord]> + 's {
        let radius = radius.max(0);
        let last = SpanKey {
            symbol: key.symbol.clone(),
            open_bucket: key.open_bucket.saturating_add(radius),
            close_bucket: i64::MAX,
        };
        let reach = radius.unsigned_abs();

        self.buckets
            .range((Bound::Excluded(key.clone()), Bound::Included(last)))
            .filter(move |(other, _)| other.close_bucket.abs_diff(key.close_bucket) <= reach)
            .map(|(_, trades)| trades.as_slice())
    }
}

impl<'a> BucketIndex<'a, OpenKey> {
    pub fn by_open<I>(trades: I, width_secs: i64) -> Self
    where
        I: IntoIterator<Item = &'a TradeRecord>,
    {
        Self::build(trades, |t| OpenKey::of(t, width_secs))
    }

    /// Buckets grouped per symbol, in key order.
    pub fn symbol_groups(&self) -> Vec<Vec<&[&'a TradeRecord]>> {
        let mut groups: Vec<Vec<&[&'a TradeRecord]>> = Vec::new();
        let mut current: Option<&str> = None;

        for (key, trades) in &self.buckets {
            if current != Some(key.symbol.as_str()) {
                groups.push(Vec::new());
                current = Some(key.symbol.as_str());
            }
            if let Some(group) = groups.last_mut() {
                group.push(trades.as_slice());
            }
        }
        groups
    }
}
