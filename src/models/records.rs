//! Result records produced by the detection engine.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::policy::PolicyMode;
use super::trade::TradeId;

/// Copy-trade category of a pair of trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    #[serde(rename = "Copy Trade")]
    CopyTrade,
    #[serde(rename = "Reverse Trade")]
    ReverseTrade,
    #[serde(rename = "Partial Copy")]
    PartialCopy,
    #[serde(rename = "No Match")]
    NoMatch,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::CopyTrade => "Copy Trade",
            Category::ReverseTrade => "Reverse Trade",
            Category::PartialCopy => "Partial Copy",
            Category::NoMatch => "No Match",
        }
    }

    /// `NoMatch` pairs are never reported.
    pub fn is_match(&self) -> bool {
        !matches!(self, Category::NoMatch)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Two trades on the same symbol from different accounts, opened and closed close together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRecord {
    pub symbol: String,
    pub trade_1: TradeId,
    pub account_1: String,
    pub trade_2: TradeId,
    pub account_2: String,
    pub opened_at_1: DateTime<Utc>,
    pub opened_at_2: DateTime<Utc>,
    pub closed_at_1: DateTime<Utc>,
    pub closed_at_2: DateTime<Utc>,
    /// Absolute open-time difference in seconds
    pub open_diff_secs: f64,
    /// Absolute close-time difference in seconds
    pub close_diff_secs: f64,
}

/// Outcome of applying the policy mode to a categorized pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyVerdict {
    pub mode: PolicyMode,
    pub same_user: bool,
    pub violation: bool,
}

/// A categorized pair of trades on the same symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRecord {
    pub trade_1: TradeId,
    pub trade_2: TradeId,
    pub symbol: String,
    pub category: Category,
    pub account_1: String,
    pub account_2: String,
    /// Present only when the pair went through the policy engine
    pub policy: Option<PolicyVerdict>,
}

impl CategoryRecord {
    pub fn is_violation(&self) -> bool {
        self.policy.as_ref().is_some_and(|p| p.violation)
    }
}

/// Stable ordering used for all engine output: symbol, then first id, then second id.
pub(crate) trait PairOrdering {
    fn pair_key(&self) -> (&str, TradeId, TradeId);
}

impl PairOrdering for MatchRecord {
    fn pair_key(&self) -> (&str, TradeId, TradeId) {
        (&self.symbol, self.trade_1, self.trade_2)
    }
}

impl PairOrdering for CategoryRecord {
    fn pair_key(&self) -> (&str, TradeId, TradeId) {
        (&self.symbol, self.trade_1, self.trade_2)
    }
}

pub(crate) fn sort_pairs<T: PairOrdering>(records: &mut [T]) {
    records.sort_by(|a, b| a.pair_key().cmp(&b.pair_key()));
}
