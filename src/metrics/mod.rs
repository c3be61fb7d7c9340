//! Run summary statistics over detection results.

mod summary;

pub use summary::{DiffStats, RunSummary, SummaryCalculator};
