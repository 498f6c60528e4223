use std::path::Path;

use serde_json::{Value, json};
use thiserror::Error;

use crate::contracts::types::{ImportIssue, ImportSummary};

pub(crate) const IMPORT_HELP_COMMAND: &str = "leakscan import --help";
pub(crate) const IMPORT_HELP_SECTION_TITLE: &str = "Import Troubleshooting";

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ClientError {
    pub code: String,
    pub message: String,
    pub recovery_steps: Vec<String>,
    pub data: Option<Value>,
}

impl ClientError {
    pub fn new(code: &str, message: &str, recovery_steps: Vec<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            recovery_steps,
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_import_help_data(self, data: Value) -> Self {
        self.with_data(merge_import_help_data(data))
    }

    /// Failures the user can fix by changing input or flags. Everything else
    /// is a ledger or internal failure.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self.code.as_str(),
            "invalid_argument"
                | "import_columns_not_detected"
                | "import_source_unreadable"
                | "import_empty"
                | "report_write_failed"
        )
    }

    pub fn invalid_argument(message: &str) -> Self {
        Self::invalid_argument_for_command(message, None)
    }

    pub fn invalid_argument_for_command(message: &str, command: Option<&str>) -> Self {
        let help_hint = match command {
            Some(cmd) => format!("Run `leakscan {cmd} --help` for usage."),
            None => "Run `leakscan --help` for usage.".to_string(),
        };
        let error = Self::new("invalid_argument", message, vec![help_hint]);
        if let Some(cmd) = command {
            return error.with_data(json!({
                "command_hint": cmd,
            }));
        }
        error
    }

    pub fn invalid_argument_with_recovery(message: &str, recovery_steps: Vec<String>) -> Self {
        Self::new("invalid_argument", message, recovery_steps)
    }

    pub fn import_columns_not_detected(missing: Vec<String>, actual_headers: Vec<String>) -> Self {
        let missing_list = missing.join(", ");
        Self::new(
            "import_columns_not_detected",
            &format!("Could not detect required CSV columns: {missing_list}."),
            vec![
                "Make sure the first row of the file is a header row.".to_string(),
                "Name the columns date, description and amount (common bank variants are also accepted).".to_string(),
                "Run `leakscan import --help` to see every accepted header name.".to_string(),
            ],
        )
        .with_import_help_data(json!({
            "missing_columns": missing,
            "actual_headers": actual_headers,
        }))
    }

    pub fn import_source_unreadable(source: &str, detail: &str) -> Self {
        Self::new(
            "import_source_unreadable",
            &format!("Could not read import source `{source}`: {detail}"),
            vec![
                "Check that the path exists and is readable.".to_string(),
                "Pass `-` to read CSV from stdin.".to_string(),
            ],
        )
        .with_import_help_data(json!({
            "source": source,
        }))
    }

    pub fn import_empty(summary: ImportSummary, issues: Vec<ImportIssue>) -> Self {
        let rows_read = summary.rows_read;
        Self::new(
            "import_empty",
            &format!("Import found no usable rows out of {rows_read} read. No rows were written."),
            vec![
                "Fix the listed issues in your source file.".to_string(),
                "Rerun leakscan import --dry-run <path>.".to_string(),
                "Then rerun leakscan import <path>.".to_string(),
            ],
        )
        .with_import_help_data(json!({
            "summary": summary,
            "issues": issues,
        }))
    }

    pub fn report_write_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "report_write_failed",
            &format!("Could not write report to `{location}`: {detail}"),
            vec!["Choose a writable location with `--out <path>`.".to_string()],
        )
    }

    pub fn internal_serialization(message: &str) -> Self {
        Self::new("internal_serialization_error", message, Vec::new())
    }

    pub fn ledger_init_permission_denied(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_init_permission_denied",
            &format!("Cannot initialize ledger at `{location}`: {detail}"),
            vec![format!(
                "Grant write access to `{location}` or set `LEAKSCAN_HOME` to a writable directory."
            )],
        )
    }

    pub fn ledger_locked(path: &Path) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_locked",
            &format!("Ledger database is locked at `{location}`."),
            vec![format!(
                "Close other processes using `{location}` so the lock is released."
            )],
        )
    }

    pub fn ledger_corrupt(path: &Path) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_corrupt",
            &format!("Ledger database appears corrupt at `{location}`."),
            vec![format!(
                "Replace `{location}` with a valid SQLite ledger file or restore from backup."
            )],
        )
    }

    pub fn migration_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "migration_failed",
            &format!("Ledger migration failed at `{location}`: {detail}"),
            vec!["Resolve conflicting schema objects referenced in the error details.".to_string()],
        )
    }

    pub fn ledger_init_failed(path: &Path, detail: &str) -> Self {
        let location = path.display().to_string();
        Self::new(
            "ledger_init_failed",
            &format!("Ledger initialization failed at `{location}`: {detail}"),
            Vec::new(),
        )
    }
}

fn merge_import_help_data(mut data: Value) -> Value {
    if !data.is_object() {
        data = json!({});
    }

    if let Some(object) = data.as_object_mut() {
        object.insert(
            "help_command".to_string(),
            Value::String(IMPORT_HELP_COMMAND.to_string()),
        );
        object.insert(
            "help_section_title".to_string(),
            Value::String(IMPORT_HELP_SECTION_TITLE.to_string()),
        );
    }

    data
}

pub type ClientResult<T> = Result<T, ClientError>;
