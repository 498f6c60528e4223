mod support;

use std::path::Path;

use leakscan_client::commands::import::{self, ImportListOptions, ImportRunOptions};
use leakscan_client::contracts::envelope::failure_from_error;
use rusqlite::Connection;
use serde_json::Value;
use support::ledger_testkit::{
    csv_body, envelope_json, import_csv, leak_fixture, temp_home_in_tmp, write_csv,
};

fn run_import(
    home: &Path,
    path: &str,
    dry_run: bool,
    stdin_override: Option<&str>,
) -> leakscan_client::ClientResult<leakscan_client::SuccessEnvelope> {
    import::run_with_options(ImportRunOptions {
        path: path.to_string(),
        account: Some("checking".to_string()),
        dry_run,
        home_override: Some(home),
        stdin_override: stdin_override.map(str::to_string),
    })
}

fn list_payload(home: &Path) -> Value {
    let result = import::list_with_options(ImportListOptions {
        home_override: Some(home),
    });
    assert!(result.is_ok());
    envelope_json(result.ok())
}

fn stored_spend(home: &Path, description: &str) -> Option<f64> {
    let connection = Connection::open(home.join("ledger.db")).ok()?;
    connection
        .query_row(
            "SELECT spend FROM internal_transactions WHERE description = ?1 LIMIT 1",
            [description],
            |row| row.get::<_, f64>(0),
        )
        .ok()
}

#[test]
fn import_persists_rows_and_reports_detected_columns() {
    let temp = temp_home_in_tmp("leakscan-import-basic");
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let payload = import_csv(&home, dir.path(), "checking", &leak_fixture());

        assert_eq!(payload["command"], "import");
        assert_eq!(payload["data"]["dry_run"], false);
        assert_eq!(payload["data"]["account"], "checking");
        assert_eq!(payload["data"]["summary"]["rows_read"], 13);
        assert_eq!(payload["data"]["summary"]["rows_imported"], 13);
        assert_eq!(payload["data"]["summary"]["rows_skipped"], 0);
        assert_eq!(payload["data"]["sign_convention"], "negative_is_spend");
        assert_eq!(payload["data"]["columns"]["date"], "Date");
        assert_eq!(payload["data"]["columns"]["description"], "Description");
        assert_eq!(payload["data"]["columns"]["amount"], "Amount");
        assert_eq!(payload["data"]["data_range"]["earliest"], "2026-01-03");
        assert_eq!(payload["data"]["data_range"]["latest"], "2026-04-10");

        let import_id = payload["data"]["import_id"].as_str().unwrap_or_default();
        assert!(import_id.starts_with("imp_"));

        assert_eq!(stored_spend(&home, "ACH SPOTIFY USA"), Some(10.0));
    }
}

#[test]
fn positive_spend_statements_are_detected_per_import() {
    let temp = temp_home_in_tmp("leakscan-import-positive");
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let body = csv_body(&[
            ("2026-01-05", "GYM MEMBERSHIP", "45.00"),
            ("2026-02-05", "GYM MEMBERSHIP", "45.00"),
            ("2026-02-09", "CARD PAYMENT THANK YOU", "-300.00"),
        ]);
        let payload = import_csv(&home, dir.path(), "card", &body);
        assert_eq!(payload["data"]["sign_convention"], "positive_is_spend");
        assert_eq!(stored_spend(&home, "GYM MEMBERSHIP"), Some(45.0));
        assert_eq!(stored_spend(&home, "CARD PAYMENT THANK YOU"), Some(0.0));
    }
}

#[test]
fn dry_run_validates_without_writing() {
    let temp = temp_home_in_tmp("leakscan-import-dry-run");
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let path = write_csv(dir.path(), "statement.csv", &leak_fixture());
        let result = run_import(&home, &path.display().to_string(), true, None);
        assert!(result.is_ok());
        let payload = envelope_json(result.ok());

        assert_eq!(payload["data"]["dry_run"], true);
        assert!(payload["data"].get("import_id").is_none());
        assert_eq!(payload["data"]["summary"]["rows_read"], 13);
        assert_eq!(payload["data"]["summary"]["rows_imported"], 0);
        assert_eq!(payload["data"]["sign_convention"], "negative_is_spend");
        let message = payload["data"]["message"].as_str().unwrap_or_default();
        assert!(message.contains("13 rows would be imported"));

        let listed = list_payload(&home);
        assert_eq!(listed["data"]["rows"].as_array().map(Vec::len), Some(0));
    }
}

#[test]
fn bad_rows_are_skipped_and_reported() {
    let temp = temp_home_in_tmp("leakscan-import-skips");
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let body = "Date,Description,Amount\n\
                    2026-01-03,NETFLIX,-15.49\n\
                    not-a-date,NETFLIX,-15.49\n\
                    2026-01-05,NETFLIX,abc\n\
                    2026-01-06,,-4.00\n";
        let payload = import_csv(&home, dir.path(), "checking", body);

        assert_eq!(payload["data"]["summary"]["rows_read"], 4);
        assert_eq!(payload["data"]["summary"]["rows_imported"], 2);
        assert_eq!(payload["data"]["summary"]["rows_skipped"], 2);

        let codes = payload["data"]["issues"]
            .as_array()
            .map(|issues| {
                issues
                    .iter()
                    .filter_map(|issue| issue["code"].as_str())
                    .collect::<Vec<&str>>()
            })
            .unwrap_or_default();
        assert_eq!(codes, vec!["invalid_date", "invalid_number"]);
        assert_eq!(payload["data"]["issues"][0]["row"], 2);
        assert_eq!(payload["data"]["issues"][0]["received"], "not-a-date");
        assert_eq!(payload["data"]["issues_truncated"], false);

        let connection = Connection::open(home.join("ledger.db"));
        assert!(connection.is_ok());
        if let Ok(conn) = connection {
            let merchant = conn.query_row(
                "SELECT merchant FROM internal_transactions WHERE posted_at = '2026-01-06'",
                [],
                |row| row.get::<_, String>(0),
            );
            assert_eq!(merchant.ok().as_deref(), Some("Unknown"));
        }
    }
}

#[test]
fn source_with_no_usable_rows_fails_with_import_empty() {
    let temp = temp_home_in_tmp("leakscan-import-empty");
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let path = write_csv(
            dir.path(),
            "broken.csv",
            "Date,Description,Amount\nyesterday,NETFLIX,-15.49\n",
        );
        let result = run_import(&home, &path.display().to_string(), false, None);
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "import_empty");
            assert!(error.is_user_error());
            let failure = failure_from_error(&error);
            let data = failure.data.unwrap_or(Value::Null);
            assert_eq!(data["summary"]["rows_read"], 1);
            assert_eq!(data["issues"][0]["code"], "invalid_date");
            assert_eq!(data["help_command"], "leakscan import --help");
        }
        assert_eq!(
            list_payload(&home)["data"]["rows"].as_array().map(Vec::len),
            Some(0)
        );
    }
}

#[test]
fn missing_columns_are_named_in_the_error() {
    let temp = temp_home_in_tmp("leakscan-import-columns");
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let path = write_csv(dir.path(), "odd.csv", "When,Memo,Total\n2026-01-01,x,1\n");
        let result = run_import(&home, &path.display().to_string(), false, None);
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "import_columns_not_detected");
            let data = error.data.unwrap_or(Value::Null);
            assert_eq!(
                data["missing_columns"],
                serde_json::json!(["date", "description", "amount"])
            );
        }
    }
}

#[test]
fn unreadable_path_is_a_user_error() {
    let temp = temp_home_in_tmp("leakscan-import-missing");
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let missing = dir.path().join("nope.csv");
        let result = run_import(&home, &missing.display().to_string(), false, None);
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "import_source_unreadable");
            assert!(error.is_user_error());
        }
    }
}

#[test]
fn stdin_import_records_source_kind() {
    let temp = temp_home_in_tmp("leakscan-import-stdin");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let body = csv_body(&[("01/15/2026", "DISNEY PLUS", "-13.99")]);
        let result = run_import(&home, "-", false, Some(&body));
        assert!(result.is_ok());
        let payload = envelope_json(result.ok());
        assert_eq!(payload["data"]["path"], Value::Null);
        assert_eq!(payload["data"]["data_range"]["earliest"], "2026-01-15");

        let listed = list_payload(&home);
        assert_eq!(listed["command"], "import list");
        assert_eq!(listed["data"]["rows"][0]["source_kind"], "stdin");
        assert!(listed["data"]["rows"][0].get("source_ref").is_none());
    }
}

#[test]
fn empty_stdin_is_rejected() {
    let temp = temp_home_in_tmp("leakscan-import-stdin-empty");
    assert!(temp.is_ok());
    if let Ok((_dir, home)) = temp {
        let result = run_import(&home, "-", false, Some("   \n"));
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "invalid_argument");
        }
    }
}

#[test]
fn import_list_shows_newest_first_with_conventions() {
    let temp = temp_home_in_tmp("leakscan-import-list");
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let first = import_csv(&home, dir.path(), "checking", &leak_fixture());
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = import_csv(
            &home,
            dir.path(),
            "card",
            &csv_body(&[("2026-05-01", "GYM", "30.00")]),
        );

        let listed = list_payload(&home);
        let rows = listed["data"]["rows"].as_array().cloned().unwrap_or_default();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["import_id"], second["data"]["import_id"]);
        assert_eq!(rows[0]["account"], "card");
        assert_eq!(rows[0]["sign_convention"], "positive_is_spend");
        assert_eq!(rows[1]["import_id"], first["data"]["import_id"]);
        assert_eq!(rows[1]["sign_convention"], "negative_is_spend");
        assert_eq!(rows[1]["rows_imported"], 13);
        assert_eq!(rows[1]["source_kind"], "file");
    }
}

#[test]
fn blank_account_is_rejected() {
    let temp = temp_home_in_tmp("leakscan-import-account");
    assert!(temp.is_ok());
    if let Ok((dir, home)) = temp {
        let path = write_csv(dir.path(), "statement.csv", &leak_fixture());
        let result = import::run_with_options(ImportRunOptions {
            path: path.display().to_string(),
            account: Some("  ".to_string()),
            dry_run: false,
            home_override: Some(&home),
            stdin_override: None,
        });
        assert!(result.is_err());
        if let Err(error) = result {
            assert_eq!(error.code, "invalid_argument");
        }
    }
}
