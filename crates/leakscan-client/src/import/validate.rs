use chrono::NaiveDate;

use crate::contracts::types::{ImportIssue, ImportSummary};
use crate::import::parse::ParsedRow;
use crate::intelligence::date::parse_statement_date;
use crate::intelligence::normalize::normalize_merchant;
use crate::intelligence::types::Transaction;

pub(crate) const MAX_REPORTED_ISSUES: usize = 20;

const DATE_EXPECTED: &str = "date such as 2026-01-31 or 01/31/2026";
const AMOUNT_EXPECTED: &str = "number such as -42.15, $1,200.00 or (9.99)";

#[derive(Debug, Clone)]
pub(crate) struct ValidatedRows {
    pub(crate) rows: Vec<Transaction>,
    pub(crate) summary: ImportSummary,
    pub(crate) issues: Vec<ImportIssue>,
    pub(crate) issues_truncated: bool,
}

/// Coerces parsed rows into ledger transactions. Rows whose date or amount do
/// not coerce are skipped, never fatal.
pub(crate) fn validate_rows(parsed_rows: Vec<ParsedRow>, account: &str) -> ValidatedRows {
    let total_rows = parsed_rows.len();
    let mut rows = Vec::new();
    let mut issues = Vec::new();
    let mut skipped = 0_i64;

    for raw in parsed_rows {
        let mut row_issues = Vec::new();

        if let Some(detail) = raw.malformed {
            row_issues.push(ImportIssue {
                row: raw.row,
                field: "row".to_string(),
                code: "malformed_row".to_string(),
                description: format!("CSV row could not be read: {detail}"),
                expected: None,
                received: None,
            });
        }

        let date = if row_issues.is_empty() {
            validate_date(raw.row, raw.date, &mut row_issues)
        } else {
            None
        };
        let amount = if row_issues.is_empty() {
            validate_amount(raw.row, raw.amount, &mut row_issues)
        } else {
            None
        };

        match (date, amount) {
            (Some(date), Some(amount)) if row_issues.is_empty() => {
                let description = normalize_optional(raw.description).unwrap_or_default();
                rows.push(Transaction {
                    date,
                    merchant: normalize_merchant(&description),
                    description,
                    amount,
                    category: normalize_optional(raw.category),
                    account: account.to_string(),
                });
            }
            _ => {
                skipped += 1;
                issues.extend(row_issues);
            }
        }
    }

    let issues_truncated = issues.len() > MAX_REPORTED_ISSUES;
    issues.truncate(MAX_REPORTED_ISSUES);

    ValidatedRows {
        summary: ImportSummary {
            rows_read: total_rows as i64,
            rows_imported: rows.len() as i64,
            rows_skipped: skipped,
        },
        rows,
        issues,
        issues_truncated,
    }
}

fn validate_date(
    row: i64,
    value: Option<String>,
    issues: &mut Vec<ImportIssue>,
) -> Option<NaiveDate> {
    let Some(candidate) = normalize_optional(value) else {
        issues.push(missing_field_issue(row, "date", DATE_EXPECTED));
        return None;
    };

    let parsed = parse_statement_date(&candidate);
    if parsed.is_none() {
        issues.push(ImportIssue {
            row,
            field: "date".to_string(),
            code: "invalid_date".to_string(),
            description: format!("date is not a recognized calendar date; got \"{candidate}\""),
            expected: Some(DATE_EXPECTED.to_string()),
            received: Some(candidate),
        });
    }
    parsed
}

fn validate_amount(row: i64, value: Option<String>, issues: &mut Vec<ImportIssue>) -> Option<f64> {
    let Some(candidate) = normalize_optional(value) else {
        issues.push(missing_field_issue(row, "amount", AMOUNT_EXPECTED));
        return None;
    };

    let parsed = parse_statement_amount(&candidate);
    if parsed.is_none() {
        issues.push(ImportIssue {
            row,
            field: "amount".to_string(),
            code: "invalid_number".to_string(),
            description: format!("amount must be numeric; got \"{candidate}\""),
            expected: Some(AMOUNT_EXPECTED.to_string()),
            received: Some(candidate),
        });
    }
    parsed
}

/// Accepts currency symbols, thousands separators and accounting-style
/// parentheses for negatives.
pub(crate) fn parse_statement_amount(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let (negated, body) = match trimmed
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
    {
        Some(inner) => (true, inner.trim()),
        None => (false, trimmed),
    };

    let cleaned = body
        .chars()
        .filter(|character| !matches!(character, '$' | ',' | ' '))
        .collect::<String>();
    if cleaned.is_empty() || !cleaned.chars().any(|character| character.is_ascii_digit()) {
        return None;
    }

    let amount = cleaned.parse::<f64>().ok()?;
    if !amount.is_finite() {
        return None;
    }
    if negated { Some(-amount.abs()) } else { Some(amount) }
}

fn missing_field_issue(row: i64, field: &str, expected: &str) -> ImportIssue {
    ImportIssue {
        row,
        field: field.to_string(),
        code: "missing_required_field".to_string(),
        description: format!("{field} must be present and non-empty."),
        expected: Some(expected.to_string()),
        received: Some(String::new()),
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    let raw = value?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}
