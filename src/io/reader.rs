//! CSV trade loader with minimal type coercion.

use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info};

use crate::models::{TradeAction, TradeId, TradeRecord};

/// Naive timestamp layouts accepted besides RFC 3339. Interpreted as UTC.
const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
];

/// Raw CSV row. Every column is optional here so missing values can be
/// reported against the trade identifier.
#[derive(Debug, Deserialize)]
struct TradeRow {
    identifier: Option<String>,
    symbol: Option<String>,
    action: Option<String>,
    lot_size: Option<String>,
    opened_at: Option<String>,
    closed_at: Option<String>,
    trading_account_login: Option<String>,
}

/// Parse a timestamp in RFC 3339 or one of the naive layouts.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(ts.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn parse_identifier(raw: &str) -> Option<TradeId> {
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<u64>() {
        return Some(TradeId(id));
    }
    // Spreadsheet exports sometimes write integral ids as "123.0"
    let value = Decimal::from_str(raw).ok()?;
    if value.fract().is_zero() && value >= Decimal::ZERO {
        value.to_u64().map(TradeId)
    } else {
        None
    }
}

impl TradeRow {
    fn into_record(self, line: usize) -> Result<TradeRecord> {
        let raw_id = self
            .identifier
            .ok_or_else(|| anyhow!("line {line}: identifier is missing"))?;
        let id = parse_identifier(&raw_id)
            .ok_or_else(|| {
                anyhow!("line {line}: identifier `{raw_id}` is not an unsigned integer")
            })?;

        let field = |value: Option<String>, name: &str| -> Result<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("trade {id}: {name} is missing"))
        };

        let symbol = field(self.symbol, "symbol")?;
        let account = field(self.trading_account_login, "trading_account_login")?;

        let action_raw = field(self.action, "action")?;
        let action = TradeAction::from_tag(&action_raw)
            .ok_or_else(|| anyhow!("trade {id}: action `{action_raw}` is not buy or sell"))?;

        let lot_raw = field(self.lot_size, "lot_size")?;
        let lot_size = Decimal::from_str(&lot_raw)
            .or_else(|_| Decimal::from_scientific(&lot_raw))
            .map_err(|_| anyhow!("trade {id}: lot_size `{lot_raw}` is not numeric"))?;

        let opened_raw = field(self.opened_at, "opened_at")?;
        let opened_at = parse_timestamp(&opened_raw)
            .ok_or_else(|| anyhow!("trade {id}: opened_at `{opened_raw}` is not a timestamp"))?;

        let closed_raw = field(self.closed_at, "closed_at")?;
        let closed_at = parse_timestamp(&closed_raw)
            .ok_or_else(|| anyhow!("trade {id}: closed_at `{closed_raw}` is not a timestamp"))?;

        Ok(TradeRecord {
            id,
            symbol,
            action,
            lot_size,
            opened_at,
            closed_at,
            account,
        })
    }
}

/// Read trades from any CSV source. Fails on the first malformed row.
pub fn read_trades_from<R: Read>(source: R) -> Result<Vec<TradeRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(source);

    let mut trades = Vec::new();
    for (idx, row) in reader.deserialize::<TradeRow>().enumerate() {
        // header is line 1
        let line = idx + 2;
        let row = row.with_context(|| format!("line {line}: malformed CSV row"))?;
        trades.push(row.into_record(line)?);
    }

    debug!(trades = trades.len(), "Parsed trade rows");
    Ok(trades)
}

/// Read trades from a CSV file.
pub fn read_trades(path: &Path) -> Result<Vec<TradeRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open trade file: {:?}", path))?;
    let trades = read_trades_from(file)
        .with_context(|| format!("Failed to load trades from {:?}", path))?;

    info!(path = ?path, trades = trades.len(), "Loaded trades");
    Ok(trades)
}
