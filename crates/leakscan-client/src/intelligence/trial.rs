use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::debug;

use crate::intelligence::normalize::merchant_key;
use crate::intelligence::policy::{DETECTOR_POLICY_V1, TrialMatching, TrialPolicy};
use crate::intelligence::spend::{positive_spend_groups, with_inferred_spend};
use crate::intelligence::stats::round_to;
use crate::intelligence::types::{SpendRecord, Transaction};

#[derive(Debug, Clone, PartialEq)]
pub struct TrialToPaidFinding {
    /// Merchant key shared by both charges, not either original name.
    pub merchant: String,
    pub trial_date: NaiveDate,
    pub trial_amount: f64,
    pub paid_date: NaiveDate,
    pub paid_amount: f64,
    pub days_between: i64,
}

/// Small charges followed by a larger one under the same merchant key.
///
/// A paid charge may satisfy several trials here; use
/// [`detect_trials_with_policy`] with [`TrialMatching::Exclusive`] to pair
/// each paid charge at most once.
pub fn detect_trial_to_paid(
    transactions: &[Transaction],
    trial_max: f64,
    lookahead_days_min: i64,
    lookahead_days_max: i64,
    paid_min: f64,
) -> Vec<TrialToPaidFinding> {
    let policy = TrialPolicy {
        trial_max,
        paid_min,
        lookahead_days_min,
        lookahead_days_max,
        ..DETECTOR_POLICY_V1.trial
    };
    detect_trials_with_policy(&with_inferred_spend(transactions), policy)
}

pub fn detect_trials_with_policy(
    records: &[SpendRecord],
    policy: TrialPolicy,
) -> Vec<TrialToPaidFinding> {
    let groups = positive_spend_groups(records, |record| merchant_key(&record.merchant));
    let mut findings = Vec::new();

    for (key, rows) in &groups {
        let trials = rows
            .iter()
            .filter(|row| policy.is_trial(row.spend))
            .collect::<Vec<&SpendRecord>>();
        let paid = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| policy.is_paid(row.spend))
            .collect::<Vec<(usize, &SpendRecord)>>();
        if trials.is_empty() || paid.is_empty() {
            continue;
        }

        let mut consumed = BTreeSet::new();
        for trial in trials {
            let Some((start, end)) = policy.window(trial.date) else {
                continue;
            };
            let matched = paid.iter().find(|(index, row)| {
                row.date >= start
                    && row.date <= end
                    && !(policy.matching == TrialMatching::Exclusive && consumed.contains(index))
            });
            let Some((index, paid_row)) = matched else {
                continue;
            };
            if policy.matching == TrialMatching::Exclusive {
                consumed.insert(*index);
            }

            findings.push(TrialToPaidFinding {
                merchant: key.clone(),
                trial_date: trial.date,
                trial_amount: round_to(trial.spend, 2),
                paid_date: paid_row.date,
                paid_amount: round_to(paid_row.spend, 2),
                days_between: (paid_row.date - trial.date).num_days(),
            });
        }
    }

    debug!(
        merchant_keys = groups.len(),
        findings = findings.len(),
        matching = policy.matching.as_str(),
        "trial-to-paid detection finished"
    );
    findings.sort_by(compare_findings);
    findings
}

fn compare_findings(left: &TrialToPaidFinding, right: &TrialToPaidFinding) -> Ordering {
    right
        .paid_amount
        .total_cmp(&left.paid_amount)
        .then_with(|| left.days_between.cmp(&right.days_between))
        .then_with(|| left.merchant.cmp(&right.merchant))
        .then_with(|| left.trial_date.cmp(&right.trial_date))
}
