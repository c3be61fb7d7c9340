//! Trade model representing one closed position on a trading account.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Unique, totally ordered trade identifier.
///
/// Pairs are always keyed smaller identifier first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradeId(pub u64);

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "buy",
            TradeAction::Sell => "sell",
        }
    }

    /// Parse a direction tag as found in trade exports.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "buy" | "long" => Some(Self::Buy),
            "sell" | "short" => Some(Self::Sell),
            _ => None,
        }
    }
}

/// Individual trade record. Immutable input to the detection engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Unique trade identifier
    pub id: TradeId,

    /// Instrument symbol (e.g. "EURUSD")
    pub symbol: String,

    /// Trade direction
    pub action: TradeAction,

    /// Position size in lots
    pub lot_size: Decimal,

    /// When the position was opened
    pub opened_at: DateTime<Utc>,

    /// When the position was closed
    pub closed_at: DateTime<Utc>,

    /// Owning trading account login
    pub account: String,
}

impl TradeRecord {
    /// How long the position was held.
    pub fn duration(&self) -> Duration {
        self.closed_at - self.opened_at
    }

    /// Whether the two trades belong to the same trading account.
    pub fn same_account(&self, other: &TradeRecord) -> bool {
        self.account == other.account
    }
}
