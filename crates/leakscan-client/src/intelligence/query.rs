use std::path::Path;

use rusqlite::params;
use tracing::debug;

use crate::ClientResult;
use crate::intelligence::date::{format_iso_date, parse_transaction_date};
use crate::intelligence::types::{AnalysisFilter, SpendRecord};
use crate::state::{map_sqlite_error, open_connection};

/// Loads ledger rows matching `filter` with the spend materialized at import.
///
/// Rows come back in `(posted_at, txn_id)` order, which is import order for
/// rows sharing a date.
pub fn load_spend_records(db_path: &Path, filter: &AnalysisFilter) -> ClientResult<Vec<SpendRecord>> {
    let connection = open_connection(db_path)?;
    let mut statement = connection
        .prepare(
            "SELECT
                posted_at,
                merchant,
                spend
             FROM internal_transactions
             WHERE (?1 IS NULL OR account = ?1)
               AND (?2 IS NULL OR posted_at >= ?2)
               AND (?3 IS NULL OR posted_at <= ?3)
             ORDER BY posted_at ASC, txn_id ASC",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let from_bound = filter.from.as_ref().map(format_iso_date);
    let to_bound = filter.to.as_ref().map(format_iso_date);

    let rows_iter = statement
        .query_map(params![filter.account, from_bound, to_bound], |row| {
            let posted_at: String = row.get(0)?;
            let merchant: String = row.get(1)?;
            let spend: f64 = row.get(2)?;
            Ok((posted_at, merchant, spend))
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in rows_iter {
        let (posted_at, merchant, spend) = row.map_err(|error| map_sqlite_error(db_path, &error))?;
        let Some(date) = parse_transaction_date(&posted_at) else {
            skipped += 1;
            continue;
        };
        records.push(SpendRecord {
            date,
            merchant,
            spend,
        });
    }

    debug!(
        loaded = records.len(),
        skipped,
        account = filter.account.as_deref().unwrap_or("*"),
        "loaded spend records"
    );
    Ok(records)
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LedgerDataRange {
    pub earliest: Option<String>,
    pub latest: Option<String>,
    pub transaction_count: i64,
}

/// Date span of the stored ledger, optionally for one account.
pub fn load_data_range(db_path: &Path, account: Option<&str>) -> ClientResult<LedgerDataRange> {
    let connection = open_connection(db_path)?;
    connection
        .query_row(
            "SELECT MIN(posted_at), MAX(posted_at), COUNT(*)
             FROM internal_transactions
             WHERE (?1 IS NULL OR account = ?1)",
            params![account],
            |row| {
                Ok(LedgerDataRange {
                    earliest: row.get(0)?,
                    latest: row.get(1)?,
                    transaction_count: row.get(2)?,
                })
            },
        )
        .map_err(|error| map_sqlite_error(db_path, &error))
}
