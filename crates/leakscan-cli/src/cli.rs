use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use leakscan_client::intelligence::policy::{
    CreepPolicy, DETECTOR_POLICY_V1, DetectorPolicy, RecurringPolicy, TrialMatching, TrialPolicy,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsoDate(pub String);

impl IsoDate {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn parse_iso_date(value: &str) -> Result<IsoDate, String> {
    if value.len() != 10 {
        return Err("date must use YYYY-MM-DD format".to_string());
    }

    let bytes = value.as_bytes();
    if bytes[4] != b'-' || bytes[7] != b'-' {
        return Err("date must use YYYY-MM-DD format".to_string());
    }

    for index in [0usize, 1, 2, 3, 5, 6, 8, 9] {
        if !bytes[index].is_ascii_digit() {
            return Err("date must use YYYY-MM-DD format".to_string());
        }
    }

    if NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
        return Err("date must use valid calendar values".to_string());
    }

    Ok(IsoDate(value.to_string()))
}

/// Extended help shown after `leakscan import --help`.
pub const IMPORT_AFTER_HELP: &str = "\
How import works:
  Export a statement from your bank as CSV and import it as-is.
  Leakscan finds the date, description and amount columns by header name
  and works out whether spending is negative or positive for this file.

  <path> is a local file path.
  To read stdin explicitly, use `-` as the path.
  Example: cat statement.csv | leakscan import --dry-run -

Accepted headers (case-insensitive):
  date         date, transaction date, posted date
  description  description, transaction description, details, name, merchant
  amount       amount, transaction amount, amt
  category     category, type (optional)

Accepted values:
  Dates like 2026-01-31, 01/31/2026, 2026/01/31 or 01/31/26.
  Amounts like -42.15, $1,200.00 or (9.99).
  Rows with an unreadable date or amount are skipped and listed as issues.

What to do next:
  1. Run `leakscan import --dry-run <path>` and check the reported issues.
  2. Run `leakscan import <path> --account <name>` once the dry run looks right.
  3. Run `leakscan analyze --account <name>` to look for leaks.
";

#[derive(Debug, Parser)]
#[command(
    name = "leakscan",
    version,
    about = "find subscription leaks in bank statement exports",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Ledger directory (defaults to $LEAKSCAN_HOME, then ~/.leakscan)
    #[arg(long, global = true, value_name = "DIR")]
    pub home: Option<PathBuf>,
    /// Log progress to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the local ledger if it does not exist yet
    Init,
    /// Import a bank statement CSV into the local ledger
    #[command(after_long_help = IMPORT_AFTER_HELP)]
    Import {
        /// Path to a CSV file (use `-` for stdin)
        path: String,
        /// Account label stored with every imported row
        #[arg(long)]
        account: Option<String>,
        /// Validate the file without writing to the ledger
        #[arg(long)]
        dry_run: bool,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// List past imports, newest first
    ImportList {
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Run every leak detector over the ledger
    Analyze(AnalyzeArgs),
    /// Find merchants billed on a roughly monthly cadence
    Recurring(AnalyzeArgs),
    /// Find merchants whose typical charge went up
    Creep(AnalyzeArgs),
    /// Find small trial charges followed by a full-price charge
    Trials(AnalyzeArgs),
    /// Write a self-contained HTML report for one account
    Report {
        /// Account to report on
        #[arg(long)]
        account: String,
        /// Output file
        #[arg(long, value_name = "PATH", default_value = "report.html")]
        out: PathBuf,
        #[command(flatten)]
        thresholds: ThresholdArgs,
    },
}

#[derive(Debug, Clone, Args)]
pub struct AnalyzeArgs {
    /// Only analyze rows imported under this account
    #[arg(long)]
    pub account: Option<String>,
    /// Start date filter (YYYY-MM-DD)
    #[arg(long, value_parser = parse_iso_date)]
    pub from: Option<IsoDate>,
    /// End date filter (YYYY-MM-DD)
    #[arg(long, value_parser = parse_iso_date)]
    pub to: Option<IsoDate>,
    #[command(flatten)]
    pub thresholds: ThresholdArgs,
    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct ThresholdArgs {
    /// Rows a merchant needs before recurring or creep detection applies
    #[arg(long, default_value_t = DETECTOR_POLICY_V1.recurring.min_occurrences)]
    pub min_occurrences: usize,
    /// Largest charge that counts as a trial
    #[arg(long, default_value_t = DETECTOR_POLICY_V1.trial.trial_max)]
    pub trial_max: f64,
    /// Smallest charge that counts as a paid conversion
    #[arg(long, default_value_t = DETECTOR_POLICY_V1.trial.paid_min)]
    pub paid_min: f64,
    /// First day after a trial that a paid charge may land on
    #[arg(long, default_value_t = DETECTOR_POLICY_V1.trial.lookahead_days_min)]
    pub lookahead_min: i64,
    /// Last day after a trial that a paid charge may land on
    #[arg(long, default_value_t = DETECTOR_POLICY_V1.trial.lookahead_days_max)]
    pub lookahead_max: i64,
    /// Let each paid charge confirm at most one trial
    #[arg(long)]
    pub exclusive_trials: bool,
}

impl ThresholdArgs {
    pub fn policy(&self) -> DetectorPolicy {
        DetectorPolicy {
            recurring: RecurringPolicy {
                min_occurrences: self.min_occurrences,
                ..DETECTOR_POLICY_V1.recurring
            },
            creep: CreepPolicy {
                min_occurrences: self.min_occurrences,
                ..DETECTOR_POLICY_V1.creep
            },
            trial: TrialPolicy {
                trial_max: self.trial_max,
                paid_min: self.paid_min,
                lookahead_days_min: self.lookahead_min,
                lookahead_days_max: self.lookahead_max,
                matching: if self.exclusive_trials {
                    TrialMatching::Exclusive
                } else {
                    TrialMatching::Permissive
                },
            },
        }
    }
}

#[cfg(test)]
pub fn parse_from<I, T>(itr: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(itr)
}
