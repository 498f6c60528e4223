use std::path::Path;

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, TransactionBehavior, params};
use ulid::Ulid;

use crate::ClientResult;
use crate::intelligence::date::format_iso_date;
use crate::intelligence::spend::SignConvention;
use crate::intelligence::types::Transaction;
use crate::state::map_sqlite_error;

#[derive(Debug, Clone)]
pub(crate) struct PersistResult {
    pub(crate) import_id: String,
    pub(crate) inserted: i64,
}

pub(crate) struct PersistInput<'a> {
    pub(crate) rows: &'a [Transaction],
    pub(crate) account: &'a str,
    pub(crate) convention: SignConvention,
    pub(crate) rows_read: i64,
    pub(crate) rows_skipped: i64,
    pub(crate) source_kind: &'a str,
    pub(crate) source_ref: Option<&'a str>,
}

/// Writes one import run and its rows atomically. Each row stores the spend
/// derived from the run's sign convention.
pub(crate) fn persist_import(
    connection: &mut Connection,
    db_path: &Path,
    input: PersistInput<'_>,
) -> ClientResult<PersistResult> {
    let import_id = format!("imp_{}", Ulid::new());
    let timestamp = now_timestamp();

    let transaction = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    transaction
        .execute(
            "INSERT INTO internal_import_runs (
                import_id,
                account,
                created_at,
                source_kind,
                source_ref,
                rows_read,
                rows_imported,
                rows_skipped,
                sign_convention
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                &import_id,
                input.account,
                &timestamp,
                input.source_kind,
                input.source_ref,
                input.rows_read,
                input.rows.len() as i64,
                input.rows_skipped,
                input.convention.as_str()
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut inserted = 0_i64;
    for row in input.rows {
        insert_transaction(&transaction, db_path, &import_id, row, input.convention)?;
        inserted += 1;
    }

    transaction
        .commit()
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    Ok(PersistResult {
        import_id,
        inserted,
    })
}

fn insert_transaction(
    transaction: &rusqlite::Transaction<'_>,
    db_path: &Path,
    import_id: &str,
    row: &Transaction,
    convention: SignConvention,
) -> ClientResult<()> {
    let txn_id = format!("txn_{}", Ulid::new());
    transaction
        .execute(
            "INSERT INTO internal_transactions (
                txn_id,
                import_id,
                account,
                posted_at,
                description,
                merchant,
                amount,
                spend,
                category
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                &txn_id,
                import_id,
                &row.account,
                format_iso_date(&row.date),
                &row.description,
                &row.merchant,
                row.amount,
                convention.spend(row.amount),
                &row.category
            ],
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(())
}

pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
