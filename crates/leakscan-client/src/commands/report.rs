use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use crate::commands::analyze::{
    AnalyzeRunOptions, analyze_all, price_creep_row, recurring_row, trial_to_paid_row,
};
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{PriceCreepRow, RecurringRow, ReportData, TrialToPaidRow};
use crate::intelligence::policy::{DETECTOR_POLICY_VERSION, DetectorPolicy};
use crate::report::html::{ReportInput, render_report};
use crate::{ClientError, ClientResult};

pub const DEFAULT_REPORT_PATH: &str = "report.html";

#[derive(Debug, Default)]
pub struct ReportRunOptions<'a> {
    pub account: String,
    pub out: Option<PathBuf>,
    pub policy: Option<DetectorPolicy>,
    pub home_override: Option<&'a Path>,
}

pub fn run(account: &str, out: Option<&Path>) -> ClientResult<SuccessEnvelope> {
    run_with_options(ReportRunOptions {
        account: account.to_string(),
        out: out.map(Path::to_path_buf),
        policy: None,
        home_override: None,
    })
}

#[doc(hidden)]
pub fn run_with_options(options: ReportRunOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let outcome = analyze_all(
        &AnalyzeRunOptions {
            account: Some(options.account.clone()),
            from: None,
            to: None,
            policy: options.policy,
            home_override: options.home_override,
        },
        "report",
    )?;
    let account = outcome.filter.account.clone().unwrap_or(options.account);

    let recurring = outcome
        .recurring
        .iter()
        .map(recurring_row)
        .collect::<Vec<RecurringRow>>();
    let price_creep = outcome
        .price_creep
        .iter()
        .map(price_creep_row)
        .collect::<Vec<PriceCreepRow>>();
    let trial_to_paid = outcome
        .trial_to_paid
        .iter()
        .map(trial_to_paid_row)
        .collect::<Vec<TrialToPaidRow>>();

    let generated_at = Local::now().format("%Y-%m-%d %H:%M").to_string();
    let html = render_report(&ReportInput {
        account: &account,
        generated_at: &generated_at,
        policy_version: DETECTOR_POLICY_VERSION,
        recurring: &recurring,
        price_creep: &price_creep,
        trial_to_paid: &trial_to_paid,
    })?;

    let out_path = absolutize_output(
        options
            .out
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_PATH)),
    )?;
    fs::write(&out_path, html)
        .map_err(|error| ClientError::report_write_failed(&out_path, &error.to_string()))?;
    info!(path = %out_path.display(), account = %account, "report written");

    let data = ReportData {
        path: out_path.display().to_string(),
        account,
        generated_at,
        recurring_count: recurring.len() as i64,
        price_creep_count: price_creep.len() as i64,
        trial_to_paid_count: trial_to_paid.len() as i64,
    };
    success("report", data)
}

fn absolutize_output(path: PathBuf) -> ClientResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path);
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(&path))
        .map_err(|error| ClientError::report_write_failed(&path, &error.to_string()))
}
