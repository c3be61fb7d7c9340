//! Copy-trade categorization by lot-size ratio and direction.

use rayon::prelude::*;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::models::{sort_pairs, Category, CategoryRecord, TradeRecord};

use super::bucket::BucketIndex;
use super::error::{validate_trades, DetectionResult};
use super::pairs::{self, CandidatePair};
use super::DetectionConfig;

/// `|lot1 - lot2| / max(lot1, lot2)`, or `None` when both lots are zero.
pub fn size_diff_ratio(lot_1: Decimal, lot_2: Decimal) -> Option<Decimal> {
    let larger = lot_1.max(lot_2);
    if larger.is_zero() {
        return None;
    }
    (lot_1 - lot_2).abs().checked_div(larger)
}

/// Categorize a pair of trades.
///
/// Exactly equal lots make a copy (same direction) or reverse (opposite
/// direction) trade, whatever the threshold. Otherwise a ratio strictly below
/// `partial_threshold` is a partial copy.
pub fn categorize(a: &TradeRecord, b: &TradeRecord, partial_threshold: Decimal) -> Category {
    let Some(ratio) = size_diff_ratio(a.lot_size, b.lot_size) else {
        return Category::NoMatch;
    };
    let direction_same = a.action == b.action;

    if ratio.is_zero() && direction_same {
        Category::CopyTrade
    } else if ratio.is_zero() {
        Category::ReverseTrade
    } else if ratio < partial_threshold {
        Category::PartialCopy
    } else {
        Category::NoMatch
    }
}

/// Categorize every same-symbol pair and hand matches to `emit`.
///
/// Categorization has no time constraint, so candidate pairs span every open
/// bucket of a symbol; the open-bucket index only orders the work.
pub(crate) fn scan_categorized<F>(
    trades: &[TradeRecord],
    config: &DetectionConfig,
    emit: F,
) -> DetectionResult<Vec<CategoryRecord>>
where
    F: Fn(CandidatePair<'_>, Category) -> Option<CategoryRecord> + Sync,
{
    validate_trades(trades)?;

    let index = BucketIndex::by_open(trades, config.bucket_width());
    let groups = index.symbol_groups();
    debug!(
        symbols = groups.len(),
        buckets = index.len(),
        "Built categorization bucket index"
    );

    let threshold = config.partial_copy_threshold;
    let scan = |group: &Vec<&[&TradeRecord]>| -> Vec<CategoryRecord> {
        pairs::across_group(group)
            .filter_map(|pair| {
                let category = categorize(pair.first, pair.second, threshold);
                if category.is_match() {
                    emit(pair, category)
                } else {
                    None
                }
            })
            .collect()
    };

    let mut records: Vec<CategoryRecord> = if config.parallel {
        groups.par_iter().flat_map_iter(|group| scan(group)).collect()
    } else {
        groups.iter().flat_map(|group| scan(group)).collect()
    };
    sort_pairs(&mut records);
    Ok(records)
}

pub(crate) fn category_record(pair: CandidatePair<'_>, category: Category) -> CategoryRecord {
    CategoryRecord {
        trade_1: pair.first.id,
        trade_2: pair.second.id,
        symbol: pair.first.symbol.clone(),
        category,
        account_1: pair.first.account.clone(),
        account_2: pair.second.account.clone(),
        policy: None,
    }
}

/// Categorize all same-symbol trade pairs, without a policy verdict.
pub fn categorize_trades(
    trades: &[TradeRecord],
    config: &DetectionConfig,
) -> DetectionResult<Vec<CategoryRecord>> {
    let records = scan_categorized(trades, config, |pair, category| {
        Some(category_record(pair, category))
    })?;

    info!(
        trades = trades.len(),
        pairs = records.len(),
        "Trade categorization complete"
    );
    Ok(records)
}
