//! Data models for trades, policy modes, and detection results.

mod policy;
mod records;
mod trade;

pub use policy::PolicyMode;
pub use records::{Category, CategoryRecord, MatchRecord, PolicyVerdict};
pub(crate) use records::sort_pairs;
pub use trade::{TradeAction, TradeId, TradeRecord};
