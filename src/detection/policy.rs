//! Policy engine: decides whether a categorized pair is reported, and
//! whether it counts as a same-user violation.

use tracing::{info, warn};

use crate::models::{CategoryRecord, PolicyMode, PolicyVerdict, TradeRecord};

use super::categorizer::{category_record, scan_categorized};
use super::error::DetectionResult;
use super::pairs::CandidatePair;
use super::DetectionConfig;

/// Apply `mode` to a categorized pair. `None` means the pair is not reported.
pub fn evaluate(pair: &CandidatePair<'_>, mode: &PolicyMode) -> Option<PolicyVerdict> {
    let same_user = pair.same_account();
    let violation = match mode {
        PolicyMode::A => false,
        PolicyMode::B => same_user,
        PolicyMode::Unrecognized(_) => return None,
    };

    Some(PolicyVerdict {
        mode: mode.clone(),
        same_user,
        violation,
    })
}

/// Categorize all same-symbol pairs and apply the policy mode to each.
///
/// An unrecognized mode is not an error: it yields no records.
pub fn classify_trades(
    trades: &[TradeRecord],
    mode: &PolicyMode,
    config: &DetectionConfig,
) -> DetectionResult<Vec<CategoryRecord>> {
    if !mode.is_recognized() {
        warn!(mode = %mode, "Unrecognized policy mode, no pairs will be reported");
    }

    let records = scan_categorized(trades, config, |pair, category| {
        let verdict = evaluate(&pair, mode)?;
        Some(CategoryRecord {
            policy: Some(verdict),
            ..category_record(pair, category)
        })
    })?;

    let violations = records.iter().filter(|r| r.is_violation()).count();
    info!(
        mode = %mode,
        pairs = records.len(),
        violations = violations,
        "Policy classification complete"
    );
    Ok(records)
}
