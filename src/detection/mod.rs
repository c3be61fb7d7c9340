//! Detection engine: similar-trade matching, copy-trade categorization and
//! policy classification over an in-memory batch of trades.

mod bucket;
mod categorizer;
mod config;
mod error;
mod pairs;
mod policy;
mod similarity;

pub use categorizer::{categorize, categorize_trades, size_diff_ratio};
pub use config::{BucketStrategy, DetectionConfig};
pub use error::{validate_trades, DetectionError, DetectionResult};
pub use pairs::CandidatePair;
pub use policy::{classify_trades, evaluate};
pub use similarity::{find_similar_trades, is_similar};
