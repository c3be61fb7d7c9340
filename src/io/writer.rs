//! CSV output for detection results.
//!
//! Writes one file per analysis into the output directory:
//! - `similar_trades.csv`
//! - `categorize_matching.csv`
//! - `configurable_behavior.csv`

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::models::{CategoryRecord, MatchRecord};

pub const SIMILAR_TRADES_FILE: &str = "similar_trades.csv";
pub const CATEGORIZED_FILE: &str = "categorize_matching.csv";
pub const POLICY_FILE: &str = "configurable_behavior.csv";

fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()
}

#[derive(Serialize)]
struct SimilarRow<'a> {
    symbol: &'a str,
    trade1_id: u64,
    account1: &'a str,
    trade2_id: u64,
    account2: &'a str,
    opened_at_1: String,
    opened_at_2: String,
    closed_at_1: String,
    closed_at_2: String,
    open_diff_sec: f64,
    close_diff_sec: f64,
}

impl<'a> From<&'a MatchRecord> for SimilarRow<'a> {
    fn from(m: &'a MatchRecord) -> Self {
        Self {
            symbol: &m.symbol,
            trade1_id: m.trade_1.0,
            account1: &m.account_1,
            trade2_id: m.trade_2.0,
            account2: &m.account_2,
            opened_at_1: format_ts(&m.opened_at_1),
            opened_at_2: format_ts(&m.opened_at_2),
            closed_at_1: format_ts(&m.closed_at_1),
            closed_at_2: format_ts(&m.closed_at_2),
            open_diff_sec: m.open_diff_secs,
            close_diff_sec: m.close_diff_secs,
        }
    }
}

#[derive(Serialize)]
struct CategoryRow<'a> {
    #[serde(rename = "Trade 1 ID")]
    trade_1: u64,
    #[serde(rename = "Trade 2 ID")]
    trade_2: u64,
    #[serde(rename = "Symbol")]
    symbol: &'a str,
    #[serde(rename = "Category")]
    category: &'static str,
}

#[derive(Serialize)]
struct PolicyRow<'a> {
    #[serde(rename = "Trade 1 ID")]
    trade_1: u64,
    #[serde(rename = "Trade 2 ID")]
    trade_2: u64,
    #[serde(rename = "Symbol")]
    symbol: &'a str,
    #[serde(rename = "Category")]
    category: &'static str,
    #[serde(rename = "Mode")]
    mode: &'a str,
    #[serde(rename = "Same User")]
    same_user: bool,
    #[serde(rename = "Violation")]
    violation: bool,
    #[serde(rename = "User1")]
    user_1: &'a str,
    #[serde(rename = "User2")]
    user_2: &'a str,
}

/// Writes result sets as CSV files under one output directory.
pub struct ResultWriter {
    output_dir: PathBuf,
}

impl ResultWriter {
    /// Creates the writer, creating the output directory if it doesn't exist.
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn write_rows<T: Serialize>(
        &self,
        file_name: &str,
        rows: impl IntoIterator<Item = T>,
    ) -> Result<PathBuf> {
        let path = self.output_dir.join(file_name);
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("Failed to create {:?}", path))?;

        let mut count = 0usize;
        for row in rows {
            writer
                .serialize(row)
                .with_context(|| format!("Failed to write row to {:?}", path))?;
            count += 1;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to flush {:?}", path))?;

        info!(path = ?path, rows = count, "Wrote results");
        Ok(path)
    }

    /// Write similar-trade matches. Returns `None` without touching disk when empty.
    pub fn write_matches(&self, matches: &[MatchRecord]) -> Result<Option<PathBuf>> {
        if matches.is_empty() {
            return Ok(None);
        }
        self.write_rows(SIMILAR_TRADES_FILE, matches.iter().map(SimilarRow::from))
            .map(Some)
    }

    /// Write categorized pairs. Returns `None` without touching disk when empty.
    pub fn write_categories(&self, records: &[CategoryRecord]) -> Result<Option<PathBuf>> {
        if records.is_empty() {
            return Ok(None);
        }
        let rows = records.iter().map(|r| CategoryRow {
            trade_1: r.trade_1.0,
            trade_2: r.trade_2.0,
            symbol: &r.symbol,
            category: r.category.as_str(),
        });
        self.write_rows(CATEGORIZED_FILE, rows).map(Some)
    }

    /// Write policy-classified pairs. Records without a verdict are skipped.
    pub fn write_policy(&self, records: &[CategoryRecord]) -> Result<Option<PathBuf>> {
        let rows: Vec<PolicyRow<'_>> = records
            .iter()
            .filter_map(|r| {
                let verdict = r.policy.as_ref()?;
                Some(PolicyRow {
                    trade_1: r.trade_1.0,
                    trade_2: r.trade_2.0,
                    symbol: &r.symbol,
                    category: r.category.as_str(),
                    mode: verdict.mode.as_str(),
                    same_user: verdict.same_user,
                    violation: verdict.violation,
                    user_1: &r.account_1,
                    user_2: &r.account_2,
                })
            })
            .collect();

        if rows.is_empty() {
            return Ok(None);
        }
        self.write_rows(POLICY_FILE, rows).map(Some)
    }
}
