use std::io;

use serde_json::Value;

use super::format;

pub fn render_init(data: &Value) -> io::Result<String> {
    let db_path = data
        .get("db_path")
        .and_then(Value::as_str)
        .ok_or_else(|| io::Error::other("init output requires db_path"))?;
    let schema_version = data
        .get("schema_version")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let transaction_count = data
        .get("transaction_count")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let range = data.get("data_range");
    let earliest = range
        .and_then(|value| value.get("earliest"))
        .and_then(Value::as_str);
    let latest = range
        .and_then(|value| value.get("latest"))
        .and_then(Value::as_str);

    let covers = match (earliest, latest) {
        (Some(start), Some(end)) => format!("{start} to {end}"),
        _ => "no transactions yet".to_string(),
    };
    let count = transaction_count.to_string();

    let mut lines = vec!["Ledger ready.".to_string(), String::new()];
    lines.extend(format::key_value_rows(
        &[
            ("Database:", db_path.to_string()),
            ("Schema:", schema_version.to_string()),
            ("Transactions:", count),
            ("Data covers:", covers),
        ],
        2,
    ));
    lines.push(String::new());
    lines.push("What to do next:".to_string());
    if transaction_count == 0 {
        lines.push("  1. Run `leakscan import --dry-run <path>` to check a statement.".to_string());
        lines.push("  2. Run `leakscan import <path> --account <name>` to load it.".to_string());
    } else {
        lines.push("  1. Run `leakscan analyze` to look for leaks.".to_string());
    }
    Ok(lines.join("\n"))
}

pub fn render_report(data: &Value) -> io::Result<String> {
    let path = data
        .get("path")
        .and_then(Value::as_str)
        .ok_or_else(|| io::Error::other("report output requires path"))?;
    let account = data
        .get("account")
        .and_then(Value::as_str)
        .unwrap_or("unknown");

    let mut lines = vec![format!("Report written to {path}"), String::new()];
    lines.extend(format::key_value_rows(
        &[
            ("Account:", account.to_string()),
            ("Recurring:", count(data, "recurring_count")),
            ("Price creep:", count(data, "price_creep_count")),
            ("Trial \u{2192} paid:", count(data, "trial_to_paid_count")),
        ],
        2,
    ));
    lines.push(String::new());
    lines.push("Open the file in a browser to view it.".to_string());
    Ok(lines.join("\n"))
}

fn count(data: &Value, key: &str) -> String {
    data.get(key)
        .and_then(Value::as_i64)
        .unwrap_or(0)
        .to_string()
}
