use std::io;

use serde_json::Value;

use super::format::{self, Column};

/// One detector's table layout.
struct Detector {
    title: &'static str,
    block_label: &'static str,
    columns: [Column<'static>; 4],
    cells: fn(&Value) -> Vec<String>,
}

const RECURRING: Detector = Detector {
    title: "Monthly recurring",
    block_label: "Subscription",
    columns: [
        Column::left("Merchant"),
        Column::right("Charges"),
        Column::right("Typical"),
        Column::left("Last charged"),
    ],
    cells: recurring_cells,
};

const PRICE_CREEP: Detector = Detector {
    title: "Price creep",
    block_label: "Increase",
    columns: [
        Column::left("Merchant"),
        Column::right("Was"),
        Column::right("Now"),
        Column::right("Change"),
    ],
    cells: creep_cells,
};

const TRIAL_TO_PAID: Detector = Detector {
    title: "Trial \u{2192} paid",
    block_label: "Conversion",
    columns: [
        Column::left("Merchant"),
        Column::left("Trial"),
        Column::left("Paid"),
        Column::right("Days"),
    ],
    cells: trial_cells,
};

pub fn render_analysis(data: &Value) -> io::Result<String> {
    let mut lines = vec![heading("Leak scan", data)];
    let mut total = 0usize;
    for (detector, key) in [
        (&RECURRING, "recurring"),
        (&PRICE_CREEP, "price_creep"),
        (&TRIAL_TO_PAID, "trial_to_paid"),
    ] {
        let rows = data
            .get(key)
            .and_then(Value::as_array)
            .ok_or_else(|| io::Error::other(format!("analyze output requires {key}")))?;
        total += rows.len();
        lines.push(String::new());
        lines.extend(render_section(detector, rows));
    }

    lines.extend(render_footer(data, total));
    Ok(lines.join("\n"))
}

pub fn render_recurring(data: &Value) -> io::Result<String> {
    render_single(&RECURRING, data)
}

pub fn render_creep(data: &Value) -> io::Result<String> {
    render_single(&PRICE_CREEP, data)
}

pub fn render_trials(data: &Value) -> io::Result<String> {
    render_single(&TRIAL_TO_PAID, data)
}

fn render_single(detector: &Detector, data: &Value) -> io::Result<String> {
    let rows = data
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("detector output requires rows"))?;

    let mut lines = vec![heading(detector.title, data), String::new()];
    lines.extend(render_section(detector, rows));
    lines.extend(render_footer(data, rows.len()));
    Ok(lines.join("\n"))
}

fn render_section(detector: &Detector, rows: &[Value]) -> Vec<String> {
    let mut lines = vec![format!("{} ({}):", detector.title, rows.len())];
    if rows.is_empty() {
        lines.push("  None found.".to_string());
        return lines;
    }

    let table_rows = rows.iter().map(detector.cells).collect::<Vec<Vec<String>>>();
    lines.extend(format::render_table_or_blocks(
        &detector.columns,
        &table_rows,
        format::terminal_width(),
        detector.block_label,
    ));
    lines
}

fn heading(title: &str, data: &Value) -> String {
    let account = data
        .get("account")
        .and_then(Value::as_str)
        .map_or_else(|| "all accounts".to_string(), |name| format!("account {name}"));
    let from = data.get("from").and_then(Value::as_str);
    let to = data.get("to").and_then(Value::as_str);
    let window = match (from, to) {
        (Some(start), Some(end)) => format!(", {start} to {end}"),
        (Some(start), None) => format!(", from {start}"),
        (None, Some(end)) => format!(", through {end}"),
        (None, None) => String::new(),
    };
    let policy = data
        .get("policy_version")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    format!("{title} for {account}{window} (policy {policy})")
}

fn render_footer(data: &Value, findings: usize) -> Vec<String> {
    let hint = data.get("data_range_hint");
    let count = hint
        .and_then(|value| value.get("transaction_count"))
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let earliest = hint
        .and_then(|value| value.get("earliest"))
        .and_then(Value::as_str);
    let latest = hint
        .and_then(|value| value.get("latest"))
        .and_then(Value::as_str);

    let mut lines = vec![String::new()];
    match (earliest, latest) {
        (Some(start), Some(end)) => {
            lines.push(format!("Data covers {start} to {end} ({count} transactions)."));
            if findings == 0 {
                lines.push(
                    "Nothing matched. Widen --from/--to or lower the thresholds to look harder."
                        .to_string(),
                );
            }
        }
        _ => {
            lines.push("No transactions imported for this selection yet.".to_string());
            lines.push("Run `leakscan import <path>` to add a statement.".to_string());
        }
    }
    lines
}

fn recurring_cells(row: &Value) -> Vec<String> {
    vec![
        text(row, "merchant"),
        integer(row, "count"),
        money(row, "typical_amount"),
        text(row, "last_date"),
    ]
}

fn creep_cells(row: &Value) -> Vec<String> {
    vec![
        text(row, "merchant"),
        money(row, "old_median"),
        money(row, "new_median"),
        format!(
            "+{:.1}%",
            row.get("increase_pct").and_then(Value::as_f64).unwrap_or(0.0)
        ),
    ]
}

fn trial_cells(row: &Value) -> Vec<String> {
    vec![
        text(row, "merchant"),
        format!("{} {}", money(row, "trial_amount"), text(row, "trial_date")),
        format!("{} {}", money(row, "paid_amount"), text(row, "paid_date")),
        integer(row, "days_between"),
    ]
}

fn text(row: &Value, key: &str) -> String {
    row.get(key)
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string()
}

fn integer(row: &Value, key: &str) -> String {
    row.get(key)
        .and_then(Value::as_i64)
        .map_or_else(|| "?".to_string(), |value| value.to_string())
}

fn money(row: &Value, key: &str) -> String {
    row.get(key)
        .and_then(Value::as_f64)
        .map_or_else(|| "?".to_string(), |value| format!("{value:.2}"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{render_analysis, render_creep, render_trials};

    #[test]
    fn analysis_renders_all_sections() {
        let data = json!({
            "policy_version": "leaks/v1",
            "account": "checking",
            "from": null,
            "to": null,
            "recurring": [{"merchant": "Netflix Com", "count": 4,
                           "typical_amount": 15.49, "last_date": "2026-04-03"}],
            "price_creep": [],
            "trial_to_paid": [{"merchant": "Disney Plus", "trial_date": "2026-01-15",
                               "trial_amount": 1.0, "paid_date": "2026-01-22",
                               "paid_amount": 13.99, "days_between": 7}],
            "data_range_hint": {"earliest": "2026-01-03", "latest": "2026-04-10",
                                "transaction_count": 13}
        });

        let rendered = render_analysis(&data);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.starts_with("Leak scan for account checking (policy leaks/v1)"));
            assert!(text.contains("Monthly recurring (1):"));
            assert!(text.contains("Netflix Com"));
            assert!(text.contains("15.49"));
            assert!(text.contains("Price creep (0):\n  None found."));
            assert!(text.contains("1.00 2026-01-15"));
            assert!(text.contains("Data covers 2026-01-03 to 2026-04-10 (13 transactions)."));
            assert!(!text.contains("Nothing matched"));
        }
    }

    #[test]
    fn single_detector_output_with_window() {
        let data = json!({
            "policy_version": "leaks/v1",
            "account": null,
            "from": "2026-02-01",
            "to": "2026-04-30",
            "rows": [{"merchant": "Spotify Usa", "old_median": 10.0,
                      "new_median": 12.0, "increase_pct": 20.0}],
            "data_range_hint": {"earliest": "2026-01-03", "latest": "2026-04-10",
                                "transaction_count": 13}
        });

        let rendered = render_creep(&data);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.starts_with("Price creep for all accounts, 2026-02-01 to 2026-04-30"));
            assert!(text.contains("+20.0%"));
        }
    }

    #[test]
    fn empty_ledger_points_at_import() {
        let data = json!({
            "policy_version": "leaks/v1",
            "rows": [],
            "data_range_hint": {"earliest": null, "latest": null, "transaction_count": 0}
        });

        let rendered = render_trials(&data);
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            assert!(text.contains("None found."));
            assert!(text.contains("No transactions imported for this selection yet."));
        }
    }

    #[test]
    fn missing_sections_are_output_errors() {
        assert!(render_analysis(&json!({"recurring": []})).is_err());
    }
}
