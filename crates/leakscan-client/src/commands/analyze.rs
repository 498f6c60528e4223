use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::ClientResult;
use crate::commands::common::{data_range_hint, load_setup};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{
    AnalysisData, DataRangeHint, DetectorData, PriceCreepRow, RecurringRow, TrialToPaidRow,
};
use crate::intelligence::creep::{PriceCreepFinding, detect_price_creep_with_policy};
use crate::intelligence::date::{build_filter, format_iso_date};
use crate::intelligence::policy::{DETECTOR_POLICY_V1, DETECTOR_POLICY_VERSION, DetectorPolicy};
use crate::intelligence::query::{load_data_range, load_spend_records};
use crate::intelligence::recurring::{RecurringFinding, detect_recurring_with_policy};
use crate::intelligence::trial::{TrialToPaidFinding, detect_trials_with_policy};
use crate::intelligence::types::{AnalysisFilter, SpendRecord};
use crate::setup::SetupContext;

#[derive(Debug, Default)]
pub struct AnalyzeRunOptions<'a> {
    pub account: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    /// Falls back to [`DETECTOR_POLICY_V1`].
    pub policy: Option<DetectorPolicy>,
    pub home_override: Option<&'a Path>,
}

/// Which detectors a command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Detectors {
    All,
    Recurring,
    Creep,
    Trials,
}

impl Detectors {
    const fn command(self) -> &'static str {
        match self {
            Self::All => "analyze",
            Self::Recurring => "recurring",
            Self::Creep => "creep",
            Self::Trials => "trials",
        }
    }
}

/// Findings from every detector over one ledger slice.
#[derive(Debug, Clone)]
pub(crate) struct AnalysisOutcome {
    pub(crate) filter: AnalysisFilter,
    pub(crate) policy: DetectorPolicy,
    pub(crate) recurring: Vec<RecurringFinding>,
    pub(crate) price_creep: Vec<PriceCreepFinding>,
    pub(crate) trial_to_paid: Vec<TrialToPaidFinding>,
    pub(crate) data_range_hint: DataRangeHint,
}

pub fn run(
    account: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
) -> ClientResult<SuccessEnvelope> {
    run_with_options(AnalyzeRunOptions {
        account: account.map(str::to_string),
        from: from.map(str::to_string),
        to: to.map(str::to_string),
        policy: None,
        home_override: None,
    })
}

#[doc(hidden)]
pub fn run_with_options(options: AnalyzeRunOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let outcome = analyze(&options, Detectors::All)?;
    let data = AnalysisData {
        policy_version: DETECTOR_POLICY_VERSION.to_string(),
        account: outcome.filter.account.clone(),
        from: outcome.filter.from.as_ref().map(format_iso_date),
        to: outcome.filter.to.as_ref().map(format_iso_date),
        trial_matching: outcome.policy.trial.matching.as_str().to_string(),
        recurring: outcome.recurring.iter().map(recurring_row).collect(),
        price_creep: outcome.price_creep.iter().map(price_creep_row).collect(),
        trial_to_paid: outcome.trial_to_paid.iter().map(trial_to_paid_row).collect(),
        data_range_hint: outcome.data_range_hint,
    };
    success(Detectors::All.command(), data)
}

#[doc(hidden)]
pub fn recurring_with_options(options: AnalyzeRunOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let outcome = analyze(&options, Detectors::Recurring)?;
    let rows = outcome.recurring.iter().map(recurring_row).collect();
    success(Detectors::Recurring.command(), detector_data(outcome, rows))
}

#[doc(hidden)]
pub fn creep_with_options(options: AnalyzeRunOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let outcome = analyze(&options, Detectors::Creep)?;
    let rows = outcome.price_creep.iter().map(price_creep_row).collect();
    success(Detectors::Creep.command(), detector_data(outcome, rows))
}

#[doc(hidden)]
pub fn trials_with_options(options: AnalyzeRunOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let outcome = analyze(&options, Detectors::Trials)?;
    let rows = outcome.trial_to_paid.iter().map(trial_to_paid_row).collect();
    success(Detectors::Trials.command(), detector_data(outcome, rows))
}

/// Runs every detector on behalf of `command`, which names the caller in
/// argument errors.
pub(crate) fn analyze_all(
    options: &AnalyzeRunOptions<'_>,
    command: &str,
) -> ClientResult<AnalysisOutcome> {
    analyze_for(options, Detectors::All, command)
}

fn analyze(options: &AnalyzeRunOptions<'_>, detectors: Detectors) -> ClientResult<AnalysisOutcome> {
    analyze_for(options, detectors, detectors.command())
}

fn analyze_for(
    options: &AnalyzeRunOptions<'_>,
    detectors: Detectors,
    command: &str,
) -> ClientResult<AnalysisOutcome> {
    let policy = options.policy.unwrap_or(DETECTOR_POLICY_V1);
    policy.validate(command)?;
    let filter = build_filter(
        options.account.as_deref(),
        options.from.as_deref(),
        options.to.as_deref(),
        command,
    )?;
    let setup = load_setup(options.home_override)?;
    run_detectors(&setup, filter, policy, detectors)
}

fn run_detectors(
    setup: &SetupContext,
    filter: AnalysisFilter,
    policy: DetectorPolicy,
    detectors: Detectors,
) -> ClientResult<AnalysisOutcome> {
    let records: Vec<SpendRecord> = load_spend_records(&setup.db_path, &filter)?;
    let data_range = load_data_range(&setup.db_path, filter.account.as_deref())?;
    let wants = |kind: Detectors| detectors == Detectors::All || detectors == kind;

    let recurring = if wants(Detectors::Recurring) {
        detect_recurring_with_policy(&records, policy.recurring)
    } else {
        Vec::new()
    };
    let price_creep = if wants(Detectors::Creep) {
        detect_price_creep_with_policy(&records, policy.creep)
    } else {
        Vec::new()
    };
    let trial_to_paid = if wants(Detectors::Trials) {
        detect_trials_with_policy(&records, policy.trial)
    } else {
        Vec::new()
    };

    info!(
        command = detectors.command(),
        records = records.len(),
        recurring = recurring.len(),
        price_creep = price_creep.len(),
        trial_to_paid = trial_to_paid.len(),
        "analysis finished"
    );

    Ok(AnalysisOutcome {
        filter,
        policy,
        recurring,
        price_creep,
        trial_to_paid,
        data_range_hint: data_range_hint(data_range),
    })
}

fn detector_data<T: Serialize>(outcome: AnalysisOutcome, rows: Vec<T>) -> DetectorData<T> {
    DetectorData {
        policy_version: DETECTOR_POLICY_VERSION.to_string(),
        account: outcome.filter.account,
        from: outcome.filter.from.as_ref().map(format_iso_date),
        to: outcome.filter.to.as_ref().map(format_iso_date),
        rows,
        data_range_hint: outcome.data_range_hint,
    }
}

pub(crate) fn recurring_row(finding: &RecurringFinding) -> RecurringRow {
    RecurringRow {
        merchant: finding.merchant.clone(),
        count: finding.count as i64,
        typical_amount: finding.typical_amount,
        last_date: format_iso_date(&finding.last_date),
    }
}

pub(crate) fn price_creep_row(finding: &PriceCreepFinding) -> PriceCreepRow {
    PriceCreepRow {
        merchant: finding.merchant.clone(),
        old_median: finding.old_median,
        new_median: finding.new_median,
        increase_pct: finding.increase_pct,
    }
}

pub(crate) fn trial_to_paid_row(finding: &TrialToPaidFinding) -> TrialToPaidRow {
    TrialToPaidRow {
        merchant: finding.merchant.clone(),
        trial_date: format_iso_date(&finding.trial_date),
        trial_amount: finding.trial_amount,
        paid_date: format_iso_date(&finding.paid_date),
        paid_amount: finding.paid_amount,
        days_between: finding.days_between,
    }
}
