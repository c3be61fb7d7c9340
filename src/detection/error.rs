use std::collections::HashSet;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{TradeId, TradeRecord};

/// Malformed trade input. Any of these fails the whole detection call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetectionError {
    #[error("trade {id}: lot size {lot} is negative")]
    InvalidLotSize { id: TradeId, lot: Decimal },

    #[error("trade {id}: symbol is missing")]
    MissingSymbol { id: TradeId },

    #[error("trade {id}: trading account is missing")]
    MissingAccount { id: TradeId },

    #[error("trade {id}: identifier appears more than once")]
    DuplicateIdentifier { id: TradeId },
}

pub type DetectionResult<T> = Result<T, DetectionError>;

/// Check the whole collection before any pairing happens.
pub fn validate_trades(trades: &[TradeRecord]) -> DetectionResult<()> {
    let mut seen = HashSet::with_capacity(trades.len());
    for trade in trades {
        if !seen.insert(trade.id) {
            return Err(DetectionError::DuplicateIdentifier { id: trade.id });
        }
        if trade.symbol.trim().is_empty() {
            return Err(DetectionError::MissingSymbol { id: trade.id });
        }
        if trade.account.trim().is_empty() {
            return Err(DetectionError::MissingAccount { id: trade.id });
        }
        if trade.lot_size < Decimal::ZERO {
            return Err(DetectionError::InvalidLotSize {
                id: trade.id,
                lot: trade.lot_size,
            });
        }
    }
    Ok(())
}
