//! File plumbing around the detection engine: trade CSV in, result CSVs out,
//! JSON policy configuration.

mod policy_file;
mod reader;
mod writer;

pub use policy_file::PolicyConfig;
pub use reader::{parse_timestamp, read_trades, read_trades_from};
pub use writer::{ResultWriter, CATEGORIZED_FILE, POLICY_FILE, SIMILAR_TRADES_FILE};
