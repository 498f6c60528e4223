mod cli;
mod dispatch;
mod output;
mod stdout_io;

use std::process::ExitCode;

use clap::{Parser, error::ErrorKind};
use leakscan_client::ClientError;
use stdout_io::write_stdout_text;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const ROOT_HELP: &str = "Leakscan - find subscription leaks in bank statement exports

Usage:
  leakscan <command>

Start here:
  leakscan import --dry-run <path>
  leakscan import <path> --account <name>
  leakscan analyze
";

const TOP_LEVEL_HELP: &str = "Leakscan - find subscription leaks in bank statement exports

USAGE: leakscan <command>

Load your statements:
  1. leakscan import --help                               Read accepted CSV headers and formats
  2. leakscan import --dry-run <path>                     Validate a CSV without writing anything
  3. leakscan import <path> --account <name>              Import transactions into the local ledger

Look for leaks:
  leakscan analyze                                        Run every detector
  leakscan recurring                                      Monthly recurring charges
  leakscan creep                                          Charges whose price went up
  leakscan trials                                         Small trials that turned into paid plans
  leakscan report --account <name> --out report.html      Write an HTML report

Other commands:
  leakscan init                                           Create the ledger and show where it lives
  leakscan import-list                                    List past imports

Add --json to import, import-list and the detector commands for machine-readable output.
Run `leakscan <command> --help` for command usage.
";

const COMMAND_NAMES: [&str; 8] = [
    "init",
    "import",
    "import-list",
    "analyze",
    "recurring",
    "creep",
    "trials",
    "report",
];

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(code) => code,
    }
}

fn run() -> Result<ExitCode, ExitCode> {
    let raw_args = std::env::args().collect::<Vec<String>>();
    if raw_args.len() == 1 {
        if write_stdout_text(ROOT_HELP).is_err() {
            return Err(ExitCode::from(2));
        }
        return Ok(ExitCode::SUCCESS);
    }

    let cli = match cli::Cli::try_parse() {
        Ok(value) => value,
        Err(err) => return handle_parse_error(&err, &raw_args),
    };
    init_tracing(cli.verbose);

    let mode = output::mode_for_command(&cli.command);
    debug!(?mode, "dispatching command");
    match dispatch::dispatch(&cli) {
        Ok(success) => {
            if output::print_success(&success, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            debug!(code = %error.code, "command failed");
            if output::print_failure(&error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Err(exit_code_for_error(&error))
        }
    }
}

/// `RUST_LOG` wins over `--verbose`; logs always go to stderr.
fn init_tracing(verbose: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .compact()
                .with_writer(std::io::stderr),
        )
        .try_init();
}

fn handle_parse_error(err: &clap::Error, raw_args: &[String]) -> Result<ExitCode, ExitCode> {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            let text = if is_top_level_help_request(raw_args) {
                TOP_LEVEL_HELP.to_string()
            } else {
                err.to_string()
            };
            if write_stdout_text(&text).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        ErrorKind::DisplayVersion => {
            if write_stdout_text(&err.to_string()).is_err() {
                return Err(ExitCode::from(2));
            }
            Ok(ExitCode::SUCCESS)
        }
        _ => {
            let command_hint = if matches!(
                err.kind(),
                ErrorKind::MissingRequiredArgument
                    | ErrorKind::InvalidValue
                    | ErrorKind::ValueValidation
                    | ErrorKind::WrongNumberOfValues
                    | ErrorKind::UnknownArgument
                    | ErrorKind::ArgumentConflict
            ) {
                command_from_args(raw_args)
            } else {
                None
            };
            let clean_message = strip_clap_boilerplate(&err.to_string());
            let parse_error =
                ClientError::invalid_argument_for_command(&clean_message, command_hint);
            let mode = infer_requested_output_mode(raw_args);
            if output::print_failure(&parse_error, mode).is_err() {
                return Err(ExitCode::from(2));
            }
            Err(ExitCode::from(1))
        }
    }
}

fn is_top_level_help_request(raw_args: &[String]) -> bool {
    raw_args.len() == 2 && matches!(raw_args[1].as_str(), "--help" | "-h")
}

/// Drops clap's usage footer so "What to do next" is the only guidance.
fn strip_clap_boilerplate(message: &str) -> String {
    let trimmed = if let Some(pos) = message.find("\n\nUsage:") {
        &message[..pos]
    } else if let Some(pos) = message.find("\nFor more information") {
        &message[..pos]
    } else {
        message
    };
    trimmed.trim_end().to_string()
}

/// First argument naming a known subcommand, for help hints.
fn command_from_args(raw_args: &[String]) -> Option<&'static str> {
    raw_args
        .iter()
        .skip(1)
        .filter(|value| !value.starts_with('-'))
        .find_map(|value| {
            COMMAND_NAMES
                .iter()
                .copied()
                .find(|name| *name == value.as_str())
        })
}

fn exit_code_for_error(error: &ClientError) -> ExitCode {
    if error.is_user_error() {
        ExitCode::from(1)
    } else {
        ExitCode::from(2)
    }
}

fn infer_requested_output_mode(raw_args: &[String]) -> output::OutputMode {
    if raw_args.iter().skip(1).any(|value| value == "--json") {
        return output::OutputMode::Json;
    }
    output::OutputMode::Text
}
