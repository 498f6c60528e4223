#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use leakscan_client::SuccessEnvelope;
use leakscan_client::commands::analyze::{self, AnalyzeRunOptions};
use leakscan_client::commands::import::{self, ImportRunOptions};
use serde_json::Value;
use tempfile::{Builder, TempDir};

pub fn temp_home_in_tmp(prefix: &str) -> std::io::Result<(TempDir, PathBuf)> {
    let dir = Builder::new().prefix(prefix).tempdir_in("/tmp")?;
    let home = dir.path().join("ledger-home");
    fs::create_dir_all(&home)?;
    Ok((dir, home))
}

pub fn write_csv(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    let result = fs::write(&path, body);
    assert!(result.is_ok());
    path
}

/// Builds a CSV body from `(date, description, amount)` rows.
pub fn csv_body(rows: &[(&str, &str, &str)]) -> String {
    let mut body = String::from("Date,Description,Amount\n");
    for (date, description, amount) in rows {
        body.push_str(&format!("{date},\"{description}\",{amount}\n"));
    }
    body
}

pub fn import_csv(home: &Path, dir: &Path, account: &str, body: &str) -> Value {
    let path = write_csv(dir, &format!("{account}.csv"), body);
    let result = import::run_with_options(ImportRunOptions {
        path: path.display().to_string(),
        account: Some(account.to_string()),
        dry_run: false,
        home_override: Some(home),
        stdin_override: None,
    });
    assert!(result.is_ok(), "import failed: {result:?}");
    envelope_json(result.ok())
}

pub fn analyze_payload(home: &Path, account: Option<&str>) -> Value {
    let result = analyze::run_with_options(AnalyzeRunOptions {
        account: account.map(str::to_string),
        home_override: Some(home),
        ..AnalyzeRunOptions::default()
    });
    assert!(result.is_ok(), "analyze failed: {result:?}");
    envelope_json(result.ok())
}

pub fn envelope_json(envelope: Option<SuccessEnvelope>) -> Value {
    if let Some(success) = envelope {
        let payload = serde_json::to_value(success);
        assert!(payload.is_ok());
        if let Ok(value) = payload {
            return value;
        }
    }
    Value::Null
}

/// A ledger exercising all three detectors, with spend as negative amounts.
pub fn leak_fixture() -> String {
    csv_body(&[
        ("2026-01-03", "POS NETFLIX.COM #1001", "-15.49"),
        ("2026-02-02", "POS NETFLIX.COM #1002", "-15.49"),
        ("2026-03-04", "POS NETFLIX.COM #1003", "-15.49"),
        ("2026-04-03", "POS NETFLIX.COM #1004", "-15.49"),
        ("2026-01-10", "ACH SPOTIFY USA", "-10.00"),
        ("2026-02-09", "ACH SPOTIFY USA", "-10.00"),
        ("2026-03-11", "ACH SPOTIFY USA", "-12.00"),
        ("2026-04-10", "ACH SPOTIFY USA", "-12.00"),
        ("2026-01-15", "DISNEY PLUS TRIAL", "-1.00"),
        ("2026-01-22", "DISNEY PLUS", "-13.99"),
        ("2026-01-20", "CORNER GROCER 0042", "-54.10"),
        ("2026-02-27", "CORNER GROCER 0042", "-61.75"),
        ("2026-03-01", "PAYROLL DEPOSIT", "2500.00"),
    ])
}
