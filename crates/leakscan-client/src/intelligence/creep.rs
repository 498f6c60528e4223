use std::cmp::Ordering;

use tracing::debug;

use crate::intelligence::policy::{CreepPolicy, DETECTOR_POLICY_V1};
use crate::intelligence::spend::{positive_spend_groups, with_inferred_spend};
use crate::intelligence::stats::{median_f64, round_to};
use crate::intelligence::types::{SpendRecord, Transaction};

#[derive(Debug, Clone, PartialEq)]
pub struct PriceCreepFinding {
    pub merchant: String,
    pub old_median: f64,
    pub new_median: f64,
    pub increase_pct: f64,
}

/// Merchants whose later charges have a materially higher median than their
/// earlier ones.
pub fn detect_price_creep(
    transactions: &[Transaction],
    min_occurrences: usize,
) -> Vec<PriceCreepFinding> {
    let policy = CreepPolicy {
        min_occurrences,
        ..DETECTOR_POLICY_V1.creep
    };
    detect_price_creep_with_policy(&with_inferred_spend(transactions), policy)
}

pub fn detect_price_creep_with_policy(
    records: &[SpendRecord],
    policy: CreepPolicy,
) -> Vec<PriceCreepFinding> {
    let groups = positive_spend_groups(records, |record| record.merchant.clone());
    let mut findings = Vec::new();

    for (merchant, rows) in &groups {
        if rows.len() < policy.min_occurrences {
            continue;
        }

        // Positional split: the middle row of an odd group lands in the newer half.
        let spends = rows.iter().map(|row| row.spend).collect::<Vec<f64>>();
        let (older, newer) = spends.split_at(spends.len() / 2);
        let (Some(old), Some(new)) = (median_f64(older), median_f64(newer)) else {
            continue;
        };
        if old <= 0.0 || !policy.is_creep(old, new) {
            continue;
        }

        findings.push(PriceCreepFinding {
            merchant: merchant.clone(),
            old_median: round_to(old, 2),
            new_median: round_to(new, 2),
            increase_pct: round_to((new - old) / old * 100.0, 1),
        });
    }

    debug!(
        merchants = groups.len(),
        findings = findings.len(),
        "price creep detection finished"
    );
    findings.sort_by(compare_findings);
    findings
}

fn compare_findings(left: &PriceCreepFinding, right: &PriceCreepFinding) -> Ordering {
    right
        .increase_pct
        .total_cmp(&left.increase_pct)
        .then_with(|| left.merchant.cmp(&right.merchant))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeDelta};

    use crate::intelligence::types::Transaction;

    use super::detect_price_creep;

    fn charge(day_offset: i64, merchant: &str, amount: f64) -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap_or(NaiveDate::MIN)
                + TimeDelta::days(day_offset),
            description: merchant.to_uppercase(),
            merchant: merchant.to_string(),
            amount,
            category: None,
            account: "default".to_string(),
        }
    }

    fn series(merchant: &str, amounts: &[f64]) -> Vec<Transaction> {
        amounts
            .iter()
            .enumerate()
            .map(|(index, amount)| charge((index as i64) * 30, merchant, -amount))
            .collect()
    }

    #[test]
    fn exactly_ten_percent_is_not_creep() {
        let rows = series("Music", &[10.0, 10.0, 11.0, 11.0]);
        assert!(detect_price_creep(&rows, 3).is_empty());
    }

    #[test]
    fn just_over_ten_percent_is_creep() {
        let rows = series("Music", &[10.0, 10.0, 11.01, 11.01]);
        let findings = detect_price_creep(&rows, 3);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].old_median, 10.0);
        assert_eq!(findings[0].new_median, 11.01);
        assert_eq!(findings[0].increase_pct, 10.1);
    }

    #[test]
    fn increase_pct_rounds_the_stored_ratio() {
        let rows = series("Parking", &[2.40, 2.40, 3.15, 3.15]);
        let findings = detect_price_creep(&rows, 3);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].old_median, 2.4);
        assert_eq!(findings[0].new_median, 3.15);
        assert_eq!(findings[0].increase_pct, 31.2);
    }

    #[test]
    fn odd_groups_put_the_middle_row_in_the_newer_half() {
        // old = [10], new = [20, 20]
        let rows = series("Insurance", &[10.0, 20.0, 20.0]);
        let findings = detect_price_creep(&rows, 3);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].old_median, 10.0);
        assert_eq!(findings[0].new_median, 20.0);
        assert_eq!(findings[0].increase_pct, 100.0);
    }

    #[test]
    fn split_is_by_date_order_not_input_order() {
        let mut rows = series("Phone", &[30.0, 30.0, 40.0, 40.0]);
        rows.reverse();
        let findings = detect_price_creep(&rows, 3);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].old_median, 30.0);
    }

    #[test]
    fn single_outlier_does_not_trigger_creep() {
        let rows = series("Power", &[50.0, 50.0, 50.0, 50.0, 95.0, 50.0]);
        assert!(detect_price_creep(&rows, 3).is_empty());
    }

    #[test]
    fn price_drops_are_ignored() {
        let rows = series("Phone", &[40.0, 40.0, 30.0, 30.0]);
        assert!(detect_price_creep(&rows, 3).is_empty());
    }

    #[test]
    fn groups_below_min_occurrences_are_skipped() {
        let rows = series("Phone", &[10.0, 20.0]);
        assert!(detect_price_creep(&rows, 3).is_empty());
    }

    #[test]
    fn single_row_group_has_no_older_half() {
        let rows = series("Once", &[10.0]);
        assert!(detect_price_creep(&rows, 1).is_empty());
    }

    #[test]
    fn findings_sort_by_increase_descending() {
        let mut rows = series("Small Bump", &[10.0, 10.0, 12.0, 12.0]);
        rows.extend(series("Big Bump", &[10.0, 10.0, 20.0, 20.0]));
        let findings = detect_price_creep(&rows, 3);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].merchant, "Big Bump");
        assert_eq!(findings[1].merchant, "Small Bump");
    }
}
