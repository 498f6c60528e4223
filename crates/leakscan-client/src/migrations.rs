use rusqlite::Connection;
use rusqlite_migration::{M, Migrations};

const BOOTSTRAP_SQL: &str = include_str!("migrations/0001_bootstrap.sql");

pub const REQUIRED_INDEX_NAMES: [&str; 4] = [
    "idx_internal_transactions_posted_at",
    "idx_internal_transactions_merchant",
    "idx_internal_transactions_account",
    "idx_internal_import_runs_created_at_desc",
];

pub const REQUIRED_META_KEYS: [(&str, &str); 2] = [
    ("schema_version", "v1"),
    ("detector_policy_version", "leaks/v1"),
];

/// `PRAGMA user_version` once every migration has run.
pub const EXPECTED_USER_VERSION: i64 = 1;

pub fn run_pending(conn: &mut Connection) -> rusqlite_migration::Result<()> {
    let migrations = Migrations::new(vec![M::up(BOOTSTRAP_SQL)]);
    migrations.to_latest(conn)
}

const REPAIR_START: &str = "-- leakscan:safe_repair:start:";
const REPAIR_END: &str = "-- leakscan:safe_repair:end:";

/// Canonical SQL for an object that may be recreated without data loss,
/// read from its marked block in the bootstrap migration.
pub fn safe_repair_statement(object_name: &str) -> Option<String> {
    let start_marker = format!("{REPAIR_START}{object_name}\n");
    let end_marker = format!("{REPAIR_END}{object_name}");

    let body_start = BOOTSTRAP_SQL.find(&start_marker)? + start_marker.len();
    let body_len = BOOTSTRAP_SQL[body_start..].find(&end_marker)?;
    let body = BOOTSTRAP_SQL[body_start..body_start + body_len].trim();
    (!body.is_empty()).then(|| body.to_string())
}
