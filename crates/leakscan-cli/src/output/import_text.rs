use std::io;

use chrono::{DateTime, Local};
use serde_json::{Map, Value};

use super::format::{self, Column};

pub fn render_import_run(data: &Value) -> io::Result<String> {
    let dry_run = data
        .get("dry_run")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let summary = data
        .get("summary")
        .and_then(Value::as_object)
        .ok_or_else(|| io::Error::other("import output requires summary"))?;

    let mut lines = vec![
        if dry_run {
            "Dry-run validation completed successfully.".to_string()
        } else {
            "Import completed successfully.".to_string()
        },
        String::new(),
        "Summary:".to_string(),
    ];

    let mut entries = Vec::new();
    if !dry_run {
        entries.push(("Import ID:", text_field(data, "import_id")));
    }
    entries.push(("Account:", text_field(data, "account")));
    entries.push(("Rows read:", get_i64(summary, "rows_read").to_string()));
    if dry_run {
        let would_import = get_i64(summary, "rows_read") - get_i64(summary, "rows_skipped");
        entries.push(("Rows usable:", would_import.to_string()));
    } else {
        entries.push(("Imported:", get_i64(summary, "rows_imported").to_string()));
    }
    entries.push(("Skipped:", get_i64(summary, "rows_skipped").to_string()));
    entries.push(("Spend sign:", sign_label(data)));
    lines.extend(format::key_value_rows(&entries, 2));

    if let Some(columns) = data.get("columns").and_then(Value::as_object) {
        lines.push(String::new());
        lines.push("Columns detected:".to_string());
        let mut column_entries = vec![
            ("date", get_str(columns, "date")),
            ("description", get_str(columns, "description")),
            ("amount", get_str(columns, "amount")),
        ];
        if columns.contains_key("category") {
            column_entries.push(("category", get_str(columns, "category")));
        }
        lines.extend(format::key_value_rows(&column_entries, 2));
    }

    lines.extend(render_issues(data));

    lines.push(String::new());
    if dry_run {
        lines.push("No rows were written because this was a dry run.".to_string());
        lines.push(String::new());
        lines.push("What to do next:".to_string());
        lines.push("  1. Rerun without --dry-run to import these rows.".to_string());
    } else {
        lines.push("What to do next:".to_string());
        lines.push(format!(
            "  1. Run `leakscan analyze --account {}` to look for leaks.",
            text_field(data, "account")
        ));
        lines.push("  2. Run `leakscan import-list` to review past imports.".to_string());
    }

    Ok(lines.join("\n"))
}

pub fn render_import_list(data: &Value) -> io::Result<String> {
    let rows = data
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("import list output requires rows"))?;

    if rows.is_empty() {
        return Ok([
            "No imports found yet.",
            "",
            "Run your first import:",
            "  1. leakscan import --help",
            "  2. leakscan import --dry-run <path>",
            "  3. leakscan import <path> --account <name>",
        ]
        .join("\n"));
    }

    let count_label = if rows.len() == 1 {
        "1 import found.".to_string()
    } else {
        format!("{} imports found.", rows.len())
    };

    let columns = [
        Column::left("Import ID"),
        Column::left("Account"),
        Column::left("Created (local)"),
        Column::right("Read"),
        Column::right("Imported"),
        Column::right("Skipped"),
        Column::left("Spend sign"),
    ];
    let table_rows = rows
        .iter()
        .map(|row| {
            vec![
                text_field(row, "import_id"),
                text_field(row, "account"),
                format_created_local(row),
                int_field(row, "rows_read"),
                int_field(row, "rows_imported"),
                int_field(row, "rows_skipped"),
                sign_label(row),
            ]
        })
        .collect::<Vec<Vec<String>>>();

    let mut lines = vec![count_label, String::new(), "Imports:".to_string()];
    lines.extend(format::render_table_or_blocks(
        &columns,
        &table_rows,
        format::terminal_width(),
        "Import",
    ));
    Ok(lines.join("\n"))
}

fn render_issues(data: &Value) -> Vec<String> {
    let Some(issues) = data.get("issues").and_then(Value::as_array) else {
        return Vec::new();
    };
    if issues.is_empty() {
        return Vec::new();
    }

    let columns = [
        Column::right("Row"),
        Column::left("Field"),
        Column::left("Problem"),
    ];
    let table_rows = issues
        .iter()
        .map(|issue| {
            vec![
                int_field(issue, "row"),
                text_field(issue, "field"),
                text_field(issue, "description"),
            ]
        })
        .collect::<Vec<Vec<String>>>();

    let mut lines = vec![String::new(), "Skipped rows:".to_string()];
    lines.extend(format::render_table_or_blocks(
        &columns,
        &table_rows,
        format::terminal_width(),
        "Issue",
    ));
    if data
        .get("issues_truncated")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        lines.push("  (more issues not shown)".to_string());
    }
    lines
}

fn sign_label(row: &Value) -> String {
    match row.get("sign_convention").and_then(Value::as_str) {
        Some("negative_is_spend") => "negative = spend".to_string(),
        Some("positive_is_spend") => "positive = spend".to_string(),
        Some(other) => other.to_string(),
        None => "unknown".to_string(),
    }
}

fn format_created_local(row: &Value) -> String {
    let Some(raw) = row.get("created_at").and_then(Value::as_str) else {
        return "unknown".to_string();
    };
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => parsed
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        Err(_) => raw.to_string(),
    }
}

fn text_field(row: &Value, key: &str) -> String {
    row.get(key)
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string()
}

fn int_field(row: &Value, key: &str) -> String {
    row.get(key)
        .and_then(Value::as_i64)
        .unwrap_or(0)
        .to_string()
}

fn get_i64(object: &Map<String, Value>, key: &str) -> i64 {
    object.get(key).and_then(Value::as_i64).unwrap_or(0)
}

fn get_str(object: &Map<String, Value>, key: &str) -> String {
    object
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string()
}
