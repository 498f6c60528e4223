pub(crate) mod input;
pub(crate) mod parse;
pub(crate) mod persist;
pub(crate) mod validate;

use std::path::Path;

use serde_json::json;
use tracing::{debug, info};

use crate::contracts::types::{ImportColumnMapping, ImportIssue, ImportSummary};
use crate::intelligence::spend::SignConvention;
use crate::setup::SetupContext;
use crate::state::open_connection;
use crate::{ClientError, ClientResult};

#[derive(Debug, Clone)]
pub(crate) struct ImportExecutionResult {
    pub dry_run: bool,
    pub import_id: Option<String>,
    pub message: String,
    pub summary: ImportSummary,
    pub sign_convention: SignConvention,
    pub columns: ImportColumnMapping,
    pub issues: Vec<ImportIssue>,
    pub issues_truncated: bool,
}

pub(crate) fn execute(
    setup: &SetupContext,
    path: &str,
    account: &str,
    dry_run: bool,
    stdin_override: Option<String>,
) -> ClientResult<ImportExecutionResult> {
    let resolved_source = input::resolve_source(path, stdin_override)?;
    let parsed = parse::parse_source(&resolved_source.content)?;
    let columns = parsed.columns.to_contract();
    let validated = validate::validate_rows(parsed.rows, account);
    debug!(
        rows_read = validated.summary.rows_read,
        rows_usable = validated.summary.rows_imported,
        rows_skipped = validated.summary.rows_skipped,
        "validated import rows"
    );

    if validated.rows.is_empty() {
        return Err(ClientError::import_empty(
            validated.summary,
            validated.issues,
        ));
    }

    // One statement file is one source, so the convention is decided once here.
    let sign_convention = SignConvention::infer(&validated.rows);

    if dry_run {
        let summary = ImportSummary {
            rows_imported: 0,
            ..validated.summary
        };
        return Ok(ImportExecutionResult {
            dry_run: true,
            import_id: None,
            message: format!(
                "Validation passed: {} rows would be imported. No rows were written.",
                validated.summary.rows_imported
            ),
            summary,
            sign_convention,
            columns,
            issues: validated.issues,
            issues_truncated: validated.issues_truncated,
        });
    }

    let db_path: &Path = &setup.db_path;
    let mut connection = open_connection(db_path)?;
    let persisted = persist::persist_import(
        &mut connection,
        db_path,
        persist::PersistInput {
            rows: &validated.rows,
            account,
            convention: sign_convention,
            rows_read: validated.summary.rows_read,
            rows_skipped: validated.summary.rows_skipped,
            source_kind: resolved_source.source_kind.as_str(),
            source_ref: resolved_source.source_ref.as_deref(),
        },
    )?;
    info!(
        import_id = %persisted.import_id,
        account,
        inserted = persisted.inserted,
        sign_convention = sign_convention.as_str(),
        "import committed"
    );

    let summary = ImportSummary {
        rows_imported: persisted.inserted,
        ..validated.summary
    };
    let message = if summary.rows_skipped > 0 {
        format!(
            "Import completed: {} rows imported, {} skipped.",
            summary.rows_imported, summary.rows_skipped
        )
    } else {
        format!("Import completed: {} rows imported.", summary.rows_imported)
    };

    Ok(ImportExecutionResult {
        dry_run: false,
        import_id: Some(persisted.import_id),
        message,
        summary,
        sign_convention,
        columns,
        issues: validated.issues,
        issues_truncated: validated.issues_truncated,
    })
}

pub(crate) fn invalid_input_error(message: &str) -> ClientError {
    ClientError::invalid_argument_with_recovery(
        message,
        vec![
            "Provide a CSV file with a header row, or pipe CSV via stdin with `-`.".to_string(),
            "Run `leakscan import --help` to see accepted column names.".to_string(),
        ],
    )
    .with_import_help_data(json!({}))
}
