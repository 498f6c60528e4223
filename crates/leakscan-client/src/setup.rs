use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::contracts::types::DataRange;
use crate::migrations::{
    EXPECTED_USER_VERSION, REQUIRED_INDEX_NAMES, REQUIRED_META_KEYS, run_pending,
    safe_repair_statement,
};
use crate::state::{
    ensure_ledger_directory, ledger_db_path, map_sqlite_error, open_connection, resolve_ledger_home,
};
use crate::{ClientError, ClientResult};

/// A table the ledger cannot work without, and the columns code reads from it.
struct TableShape {
    name: &'static str,
    columns: &'static [&'static str],
}

const LEDGER_TABLES: [TableShape; 3] = [
    TableShape {
        name: "internal_meta",
        columns: &["key", "value"],
    },
    TableShape {
        name: "internal_import_runs",
        columns: &[
            "import_id",
            "account",
            "created_at",
            "source_kind",
            "source_ref",
            "rows_read",
            "rows_imported",
            "rows_skipped",
            "sign_convention",
        ],
    },
    TableShape {
        name: "internal_transactions",
        columns: &[
            "txn_id",
            "import_id",
            "account",
            "posted_at",
            "description",
            "merchant",
            "amount",
            "spend",
            "category",
        ],
    },
];

#[derive(Debug, Clone)]
pub struct SetupContext {
    pub db_path: PathBuf,
    pub schema_version: String,
    pub transaction_count: i64,
    pub data_range: DataRange,
}

pub fn ensure_initialized() -> ClientResult<SetupContext> {
    open_ledger(None)
}

pub fn ensure_initialized_at(home_override: &Path) -> ClientResult<SetupContext> {
    open_ledger(Some(home_override))
}

/// Creates or upgrades the ledger, repairs what is safe to repair, and refuses
/// a database whose shape does not match.
fn open_ledger(home_override: Option<&Path>) -> ClientResult<SetupContext> {
    let ledger_home = resolve_ledger_home(home_override)?;
    ensure_ledger_directory(&ledger_home)?;

    let db_path = ledger_db_path(&ledger_home);
    let mut connection = open_connection(&db_path)?;
    run_pending(&mut connection).map_err(|error| map_migration_error(&db_path, &error))?;

    let ledger = Ledger {
        connection: &connection,
        db_path: &db_path,
    };
    ledger.check_table_shapes()?;
    ledger.restore_meta_keys()?;
    ledger.restore_indexes()?;
    ledger.check_repaired_state()?;

    let schema_version = ledger
        .meta_value("schema_version")?
        .unwrap_or_else(|| "v1".to_string());
    let (data_range, transaction_count) = ledger.data_range()?;
    debug!(
        db_path = %db_path.display(),
        schema_version = %schema_version,
        transaction_count,
        "ledger ready"
    );

    Ok(SetupContext {
        db_path,
        schema_version,
        transaction_count,
        data_range,
    })
}

/// Migration failures that are really lock, corruption, or permission
/// problems keep their specific code.
fn map_migration_error(db_path: &Path, error: &rusqlite_migration::Error) -> ClientError {
    if let rusqlite_migration::Error::RusqliteError { err, .. } = error {
        let mapped = map_sqlite_error(db_path, err);
        if matches!(
            mapped.code.as_str(),
            "ledger_locked" | "ledger_corrupt" | "ledger_init_permission_denied"
        ) {
            return mapped;
        }
    }
    ClientError::migration_failed(db_path, &error.to_string())
}

struct Ledger<'a> {
    connection: &'a Connection,
    db_path: &'a Path,
}

impl Ledger<'_> {
    fn check_table_shapes(&self) -> ClientResult<()> {
        let tables = self.object_names("table")?;
        for shape in &LEDGER_TABLES {
            if !tables.contains(shape.name) {
                return Err(ClientError::ledger_corrupt(self.db_path));
            }
            let present = self.column_names(shape.name)?;
            if shape.columns.iter().any(|column| !present.contains(*column)) {
                return Err(ClientError::ledger_corrupt(self.db_path));
            }
        }
        Ok(())
    }

    // Insert-only: a missing key is restored, a drifted value fails the check.
    fn restore_meta_keys(&self) -> ClientResult<()> {
        for (key, default_value) in REQUIRED_META_KEYS {
            self.connection
                .execute(
                    "INSERT OR IGNORE INTO internal_meta (key, value) VALUES (?1, ?2)",
                    params![key, default_value],
                )
                .map_err(|error| self.sqlite_error(&error))?;
        }
        Ok(())
    }

    fn restore_indexes(&self) -> ClientResult<()> {
        let indexes = self.object_names("index")?;
        for name in REQUIRED_INDEX_NAMES {
            if indexes.contains(name) {
                continue;
            }
            let sql = safe_repair_statement(name).ok_or_else(|| {
                ClientError::ledger_init_failed(self.db_path, "Missing canonical SQL for index repair.")
            })?;
            debug!(index = name, "recreating missing index");
            self.connection
                .execute_batch(&sql)
                .map_err(|error| self.sqlite_error(&error))?;
        }
        Ok(())
    }

    fn check_repaired_state(&self) -> ClientResult<()> {
        let user_version = self
            .connection
            .query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0))
            .map_err(|error| self.sqlite_error(&error))?;
        if user_version != EXPECTED_USER_VERSION {
            return Err(ClientError::ledger_corrupt(self.db_path));
        }

        for (key, expected) in REQUIRED_META_KEYS {
            if self.meta_value(key)?.as_deref() != Some(expected) {
                return Err(ClientError::ledger_corrupt(self.db_path));
            }
        }

        let indexes = self.object_names("index")?;
        if REQUIRED_INDEX_NAMES.iter().any(|name| !indexes.contains(*name)) {
            return Err(ClientError::ledger_corrupt(self.db_path));
        }
        Ok(())
    }

    fn object_names(&self, object_type: &str) -> ClientResult<HashSet<String>> {
        let mut statement = self
            .connection
            .prepare("SELECT name FROM sqlite_master WHERE type = ?1")
            .map_err(|error| self.sqlite_error(&error))?;
        let names = statement
            .query_map([object_type], |row| row.get::<_, String>(0))
            .map_err(|error| self.sqlite_error(&error))?
            .collect::<Result<HashSet<String>, _>>()
            .map_err(|error| self.sqlite_error(&error))?;
        Ok(names)
    }

    fn column_names(&self, table_name: &str) -> ClientResult<HashSet<String>> {
        let mut statement = self
            .connection
            .prepare("SELECT name FROM pragma_table_info(?1)")
            .map_err(|error| self.sqlite_error(&error))?;
        let names = statement
            .query_map([table_name], |row| row.get::<_, String>(0))
            .map_err(|error| self.sqlite_error(&error))?
            .collect::<Result<HashSet<String>, _>>()
            .map_err(|error| self.sqlite_error(&error))?;
        Ok(names)
    }

    fn meta_value(&self, key: &str) -> ClientResult<Option<String>> {
        self.connection
            .query_row(
                "SELECT value FROM internal_meta WHERE key = ?1 LIMIT 1",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(|error| self.sqlite_error(&error))
    }

    fn data_range(&self) -> ClientResult<(DataRange, i64)> {
        self.connection
            .query_row(
                "SELECT MIN(posted_at), MAX(posted_at), COUNT(*) FROM internal_transactions",
                [],
                |row| {
                    let range = DataRange {
                        earliest: row.get(0)?,
                        latest: row.get(1)?,
                    };
                    Ok((range, row.get::<_, i64>(2)?))
                },
            )
            .map_err(|error| self.sqlite_error(&error))
    }

    fn sqlite_error(&self, error: &rusqlite::Error) -> ClientError {
        map_sqlite_error(self.db_path, error)
    }
}
