use std::cmp::Ordering;

use chrono::NaiveDate;
use tracing::debug;

use crate::intelligence::policy::{DETECTOR_POLICY_V1, RecurringPolicy};
use crate::intelligence::spend::{positive_spend_groups, with_inferred_spend};
use crate::intelligence::stats::{median_f64, round_to};
use crate::intelligence::types::{SpendRecord, Transaction};

#[derive(Debug, Clone, PartialEq)]
pub struct RecurringFinding {
    pub merchant: String,
    pub count: usize,
    pub typical_amount: f64,
    pub last_date: NaiveDate,
}

/// Merchants billed at a roughly monthly cadence, inferring the sign
/// convention from `transactions` alone.
pub fn detect_monthly_recurring(
    transactions: &[Transaction],
    min_occurrences: usize,
) -> Vec<RecurringFinding> {
    let policy = RecurringPolicy {
        min_occurrences,
        ..DETECTOR_POLICY_V1.recurring
    };
    detect_recurring_with_policy(&with_inferred_spend(transactions), policy)
}

pub fn detect_recurring_with_policy(
    records: &[SpendRecord],
    policy: RecurringPolicy,
) -> Vec<RecurringFinding> {
    let groups = positive_spend_groups(records, |record| record.merchant.clone());
    let mut findings = Vec::new();

    for (merchant, rows) in &groups {
        if rows.len() < policy.min_occurrences {
            continue;
        }

        let gaps = rows
            .windows(2)
            .map(|pair| (pair[1].date - pair[0].date).num_days())
            .collect::<Vec<i64>>();
        if gaps.is_empty() {
            continue;
        }

        let monthly = gaps
            .iter()
            .filter(|gap| policy.is_monthly_gap(**gap))
            .count();
        let monthly_ratio = (monthly as f64) / (gaps.len() as f64);
        if !policy.passes(monthly_ratio) {
            continue;
        }

        let spends = rows.iter().map(|row| row.spend).collect::<Vec<f64>>();
        let Some(typical) = median_f64(&spends) else {
            continue;
        };
        let Some(last_date) = rows.iter().map(|row| row.date).max() else {
            continue;
        };

        findings.push(RecurringFinding {
            merchant: merchant.clone(),
            count: rows.len(),
            typical_amount: round_to(typical, 2),
            last_date,
        });
    }

    debug!(
        merchants = groups.len(),
        findings = findings.len(),
        "recurring detection finished"
    );
    findings.sort_by(compare_findings);
    findings
}

fn compare_findings(left: &RecurringFinding, right: &RecurringFinding) -> Ordering {
    right
        .count
        .cmp(&left.count)
        .then_with(|| right.typical_amount.total_cmp(&left.typical_amount))
        .then_with(|| left.merchant.cmp(&right.merchant))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeDelta};

    use crate::intelligence::types::Transaction;

    use super::detect_monthly_recurring;

    fn base_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or(NaiveDate::MIN)
    }

    fn charge(day_offset: i64, merchant: &str, amount: f64) -> Transaction {
        Transaction {
            date: base_date() + TimeDelta::days(day_offset),
            description: merchant.to_uppercase(),
            merchant: merchant.to_string(),
            amount,
            category: None,
            account: "default".to_string(),
        }
    }

    #[test]
    fn six_charges_thirty_days_apart_yield_one_finding() {
        let rows = [0, 30, 60, 90, 120, 150]
            .iter()
            .map(|day| charge(*day, "Streamflix", -9.99))
            .collect::<Vec<Transaction>>();

        let findings = detect_monthly_recurring(&rows, 3);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].merchant, "Streamflix");
        assert_eq!(findings[0].count, 6);
        assert_eq!(findings[0].typical_amount, 9.99);
        assert_eq!(findings[0].last_date, base_date() + TimeDelta::days(150));
    }

    #[test]
    fn positive_spend_sources_are_detected_too() {
        let rows = [0, 31, 59, 90]
            .iter()
            .map(|day| charge(*day, "Gym", 40.0))
            .collect::<Vec<Transaction>>();

        let findings = detect_monthly_recurring(&rows, 3);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].typical_amount, 40.0);
    }

    #[test]
    fn too_few_occurrences_emit_nothing() {
        let rows = vec![charge(0, "Gym", -40.0), charge(30, "Gym", -40.0)];
        assert!(detect_monthly_recurring(&rows, 3).is_empty());
    }

    #[test]
    fn tolerates_one_off_cadence_gap() {
        // gaps 30, 30, 12, 30, 30 -> 4 of 5 in band
        let rows = [0, 30, 60, 72, 102, 132]
            .iter()
            .map(|day| charge(*day, "News", -5.0))
            .collect::<Vec<Transaction>>();
        assert_eq!(detect_monthly_recurring(&rows, 3).len(), 1);
    }

    #[test]
    fn weekly_cadence_is_not_monthly() {
        let rows = [0, 7, 14, 21, 28]
            .iter()
            .map(|day| charge(*day, "Coffee Club", -6.0))
            .collect::<Vec<Transaction>>();
        assert!(detect_monthly_recurring(&rows, 3).is_empty());
    }

    #[test]
    fn band_edges_are_inclusive() {
        let inside = [0, 26, 59]
            .iter()
            .map(|day| charge(*day, "Edge", -12.0))
            .collect::<Vec<Transaction>>();
        assert_eq!(detect_monthly_recurring(&inside, 3).len(), 1);

        let outside = [0, 25, 59]
            .iter()
            .map(|day| charge(*day, "Edge", -12.0))
            .collect::<Vec<Transaction>>();
        // gaps 25 and 34 -> ratio 0
        assert!(detect_monthly_recurring(&outside, 3).is_empty());
    }

    #[test]
    fn refunds_in_positive_sources_are_excluded_from_the_count() {
        let mut rows = [0, 30, 60]
            .iter()
            .map(|day| charge(*day, "Cloud", 3.0))
            .collect::<Vec<Transaction>>();
        rows.push(charge(45, "Cloud", -3.0));

        let findings = detect_monthly_recurring(&rows, 3);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].count, 3);
    }

    #[test]
    fn findings_sort_by_count_then_typical_amount() {
        let mut rows = Vec::new();
        for day in [0, 30, 60] {
            rows.push(charge(day, "Cheap", -5.0));
            rows.push(charge(day, "Pricey", -50.0));
        }
        for day in [0, 30, 60, 90] {
            rows.push(charge(day, "Frequent", -1.0));
        }

        let findings = detect_monthly_recurring(&rows, 3);
        let merchants = findings
            .iter()
            .map(|finding| finding.merchant.as_str())
            .collect::<Vec<&str>>();
        assert_eq!(merchants, vec!["Frequent", "Pricey", "Cheap"]);
    }

    #[test]
    fn empty_input_yields_no_findings() {
        assert!(detect_monthly_recurring(&[], 3).is_empty());
    }
}
