//! Run summary: match counts, time-difference statistics, category and
//! violation breakdown.

use std::collections::BTreeMap;

use statrs::statistics::Statistics;

use crate::models::{Category, CategoryRecord, MatchRecord, PolicyMode};

/// Spread of a set of time differences, in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DiffStats {
    pub mean: f64,
    pub std_dev: f64,
    pub max: f64,
}

impl DiffStats {
    fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let std_dev = if samples.len() > 1 {
            Statistics::std_dev(samples)
        } else {
            0.0
        };
        Self {
            mean: Statistics::mean(samples),
            std_dev,
            max: Statistics::max(samples),
        }
    }
}

/// Summary of one full analysis run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Trades loaded from the input
    pub trades_loaded: usize,

    /// Trades eligible for similarity matching
    pub trades_eligible: usize,

    /// Similar trade pairs found
    pub similar_pairs: usize,

    /// Distinct accounts involved in at least one similar pair
    pub accounts_involved: usize,

    /// Open-time differences across similar pairs
    pub open_diff: DiffStats,

    /// Close-time differences across similar pairs
    pub close_diff: DiffStats,

    /// Categorized pairs per category
    pub categories: BTreeMap<Category, usize>,

    /// Policy mode applied, if classification ran
    pub policy_mode: Option<PolicyMode>,

    /// Pairs reported under the policy mode
    pub policy_pairs: usize,

    /// Same-user violations under the policy mode
    pub violations: usize,
}

/// Calculator for run summaries.
pub struct SummaryCalculator;

impl SummaryCalculator {
    pub fn calculate(
        trades_loaded: usize,
        trades_eligible: usize,
        matches: &[MatchRecord],
        categorized: &[CategoryRecord],
        classified: Option<(&PolicyMode, &[CategoryRecord])>,
    ) -> RunSummary {
        let mut summary = RunSummary {
            trades_loaded,
            trades_eligible,
            similar_pairs: matches.len(),
            ..Default::default()
        };

        Self::calculate_match_stats(&mut summary, matches);

        for record in categorized {
            *summary.categories.entry(record.category).or_insert(0) += 1;
        }

        if let Some((mode, records)) = classified {
            summary.policy_mode = Some(mode.clone());
            summary.policy_pairs = records.len();
            summary.violations = records.iter().filter(|r| r.is_violation()).count();
        }

        summary
    }

    fn calculate_match_stats(summary: &mut RunSummary, matches: &[MatchRecord]) {
        let open: Vec<f64> = matches.iter().map(|m| m.open_diff_secs).collect();
        let close: Vec<f64> = matches.iter().map(|m| m.close_diff_secs).collect();
        summary.open_diff = DiffStats::from_samples(&open);
        summary.close_diff = DiffStats::from_samples(&close);

        let mut accounts: Vec<&str> = matches
            .iter()
            .flat_map(|m| [m.account_1.as_str(), m.account_2.as_str()])
            .collect();
        accounts.sort_unstable();
        accounts.dedup();
        summary.accounts_involved = accounts.len();
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n{:=^60}", " SURVEILLANCE SUMMARY ")?;
        writeln!(f)?;
        writeln!(f, "--- Input ---")?;
        writeln!(f, "Trades Loaded:    {}", self.trades_loaded)?;
        writeln!(f, "Eligible:         {}", self.trades_eligible)?;
        writeln!(f)?;
        writeln!(f, "--- Similar Trades ---")?;
        writeln!(f, "Pairs:            {}", self.similar_pairs)?;
        writeln!(f, "Accounts:         {}", self.accounts_involved)?;
        writeln!(
            f,
            "Open Diff:        mean {:.1}s, sd {:.1}s, max {:.1}s",
            self.open_diff.mean, self.open_diff.std_dev, self.open_diff.max
        )?;
        writeln!(
            f,
            "Close Diff:       mean {:.1}s, sd {:.1}s, max {:.1}s",
            self.close_diff.mean, self.close_diff.std_dev, self.close_diff.max
        )?;
        writeln!(f)?;
        writeln!(f, "--- Categories ---")?;
        for category in [Category::CopyTrade, Category::ReverseTrade, Category::PartialCopy] {
            let count = self.categories.get(&category).copied().unwrap_or(0);
            writeln!(f, "{:<17} {}", format!("{}:", category), count)?;
        }
        if let Some(mode) = &self.policy_mode {
            writeln!(f)?;
            writeln!(f, "--- Policy ---")?;
            writeln!(f, "Mode:             {}", mode)?;
            writeln!(f, "Reported Pairs:   {}", self.policy_pairs)?;
            writeln!(f, "Violations:       {}", self.violations)?;
        }
        writeln!(f, "{:=^60}", "")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PolicyVerdict, TradeId};
    use chrono::{TimeZone, Utc};

    fn match_record(id_1: u64, id_2: u64, open_diff: f64, close_diff: f64) -> MatchRecord {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        MatchRecord {
            symbol: "EURUSD".to_string(),
            trade_1: TradeId(id_1),
            account_1: format!("U{id_1}"),
            trade_2: TradeId(id_2),
            account_2: format!("U{id_2}"),
            opened_at_1: t,
            opened_at_2: t,
            closed_at_1: t,
            closed_at_2: t,
            open_diff_secs: open_diff,
            close_diff_secs: close_diff,
        }
    }

    fn category_record(category: Category, violation: bool) -> CategoryRecord {
        CategoryRecord {
            trade_1: TradeId(1),
            trade_2: TradeId(2),
            symbol: "EURUSD".to_string(),
            category,
            account_1: "U1".to_string(),
            account_2: "U1".to_string(),
            policy: Some(PolicyVerdict {
                mode: PolicyMode::B,
                same_user: true,
                violation,
            }),
        }
    }

    #[test]
    fn test_match_statistics() {
        let matches = vec![
            match_record(1, 2, 60.0, 10.0),
            match_record(1, 3, 120.0, 30.0),
            match_record(2, 3, 180.0, 50.0),
        ];
        let summary = SummaryCalculator::calculate(10, 8, &matches, &[], None);

        assert_eq!(summary.similar_pairs, 3);
        assert_eq!(summary.accounts_involved, 3);
        assert!((summary.open_diff.mean - 120.0).abs() < 1e-9);
        assert!((summary.open_diff.max - 180.0).abs() < 1e-9);
        assert!((summary.close_diff.std_dev - 20.0).abs() < 1e-9);
        assert!(summary.policy_mode.is_none());
    }

    #[test]
    fn test_empty_run() {
        let summary = SummaryCalculator::calculate(0, 0, &[], &[], None);
        assert_eq!(summary.open_diff, DiffStats::default());
        assert!(summary.to_string().contains("Pairs:            0"));
    }

    #[test]
    fn test_category_and_violation_counts() {
        let categorized = vec![
            category_record(Category::CopyTrade, true),
            category_record(Category::CopyTrade, false),
            category_record(Category::PartialCopy, false),
        ];
        let summary = SummaryCalculator::calculate(
            3,
            3,
            &[],
            &categorized,
            Some((&PolicyMode::B, &categorized)),
        );

        assert_eq!(summary.categories.get(&Category::CopyTrade), Some(&2));
        assert_eq!(summary.categories.get(&Category::PartialCopy), Some(&1));
        assert_eq!(summary.policy_pairs, 3);
        assert_eq!(summary.violations, 1);
        assert!(summary.to_string().contains("Violations:       1"));
    }
}
