use std::path::Path;

use crate::commands::common::load_setup;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{ImportData, ImportListData, ImportListItem};
use crate::import;
use crate::state::{map_sqlite_error, open_connection};
use crate::{ClientError, ClientResult};

pub const DEFAULT_ACCOUNT: &str = "default";

#[derive(Debug, Default)]
pub struct ImportRunOptions<'a> {
    pub path: String,
    pub account: Option<String>,
    pub dry_run: bool,
    pub home_override: Option<&'a Path>,
    pub stdin_override: Option<String>,
}

#[derive(Debug, Default)]
pub struct ImportListOptions<'a> {
    pub home_override: Option<&'a Path>,
}

pub fn run(path: &str, account: Option<&str>, dry_run: bool) -> ClientResult<SuccessEnvelope> {
    run_with_options(ImportRunOptions {
        path: path.to_string(),
        account: account.map(str::to_string),
        dry_run,
        home_override: None,
        stdin_override: None,
    })
}

#[doc(hidden)]
pub fn run_with_options(options: ImportRunOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let account = resolve_account(options.account.as_deref())?;
    let setup = load_setup(options.home_override)?;
    let execution = import::execute(
        &setup,
        &options.path,
        &account,
        options.dry_run,
        options.stdin_override,
    )?;
    let data_range = if options.dry_run {
        setup.data_range
    } else {
        load_setup(options.home_override)?.data_range
    };

    let data = ImportData {
        dry_run: execution.dry_run,
        path: Some(options.path).filter(|path| path != import::input::STDIN_PATH),
        import_id: execution.import_id,
        account,
        message: execution.message,
        summary: execution.summary,
        sign_convention: execution.sign_convention.as_str().to_string(),
        columns: execution.columns,
        issues: execution.issues,
        issues_truncated: execution.issues_truncated,
        data_range,
    };

    success("import", data)
}

pub fn list() -> ClientResult<SuccessEnvelope> {
    list_with_options(ImportListOptions {
        home_override: None,
    })
}

#[doc(hidden)]
pub fn list_with_options(options: ImportListOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let db_path = setup.db_path.as_path();
    let connection = open_connection(db_path)?;
    let mut statement = connection
        .prepare(
            "SELECT
                import_id,
                account,
                created_at,
                rows_read,
                rows_imported,
                rows_skipped,
                sign_convention,
                source_kind,
                source_ref
             FROM internal_import_runs
             ORDER BY created_at DESC, import_id DESC",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    let rows_iter = statement
        .query_map([], |row| {
            Ok(ImportListItem {
                import_id: row.get(0)?,
                account: row.get(1)?,
                created_at: row.get(2)?,
                rows_read: row.get(3)?,
                rows_imported: row.get(4)?,
                rows_skipped: row.get(5)?,
                sign_convention: row.get(6)?,
                source_kind: row.get::<_, Option<String>>(7)?,
                source_ref: row.get::<_, Option<String>>(8)?,
            })
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut rows = Vec::new();
    for row in rows_iter {
        rows.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }

    success("import list", ImportListData { rows })
}

fn resolve_account(account: Option<&str>) -> ClientResult<String> {
    match account.map(str::trim) {
        None => Ok(DEFAULT_ACCOUNT.to_string()),
        Some("") => Err(ClientError::invalid_argument_for_command(
            "`account` must not be empty.",
            Some("import"),
        )),
        Some(value) => Ok(value.to_string()),
    }
}
