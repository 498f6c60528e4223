use crate::contracts::types::ImportColumnMapping;
use crate::import::invalid_input_error;
use crate::{ClientError, ClientResult};

/// Accepted header names per field, highest priority first.
pub(crate) const DATE_HEADERS: [&str; 3] = ["date", "transaction date", "posted date"];
pub(crate) const DESCRIPTION_HEADERS: [&str; 5] = [
    "description",
    "transaction description",
    "details",
    "name",
    "merchant",
];
pub(crate) const AMOUNT_HEADERS: [&str; 3] = ["amount", "transaction amount", "amt"];
pub(crate) const CATEGORY_HEADERS: [&str; 2] = ["category", "type"];

#[derive(Debug, Clone)]
pub(crate) struct ParsedRow {
    pub(crate) row: i64,
    pub(crate) date: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) amount: Option<String>,
    pub(crate) category: Option<String>,
    /// Set when the CSV reader could not decode the record.
    pub(crate) malformed: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct DetectedColumns {
    date: (usize, String),
    description: (usize, String),
    amount: (usize, String),
    category: Option<(usize, String)>,
}

impl DetectedColumns {
    pub(crate) fn to_contract(&self) -> ImportColumnMapping {
        ImportColumnMapping {
            date: self.date.1.clone(),
            description: self.description.1.clone(),
            amount: self.amount.1.clone(),
            category: self.category.as_ref().map(|(_, name)| name.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ParsedSource {
    pub(crate) columns: DetectedColumns,
    pub(crate) rows: Vec<ParsedRow>,
}

pub(crate) fn parse_source(content: &str) -> ClientResult<ParsedSource> {
    let trimmed = content.trim_start_matches('\u{feff}');
    if trimmed.trim().is_empty() {
        return Err(invalid_input_error("Import source is empty."));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(trimmed.as_bytes());

    let headers = reader
        .headers()
        .map_err(|_| invalid_input_error("CSV header row is missing or unreadable."))?
        .iter()
        .map(|value| value.trim().to_string())
        .collect::<Vec<String>>();

    let columns = detect_columns(&headers)?;

    let mut rows = Vec::new();
    for (row_index, result_row) in reader.records().enumerate() {
        let row = (row_index as i64) + 1;
        let record = match result_row {
            Ok(record) => record,
            Err(error) => {
                rows.push(ParsedRow {
                    row,
                    date: None,
                    description: None,
                    amount: None,
                    category: None,
                    malformed: Some(error.to_string()),
                });
                continue;
            }
        };

        rows.push(ParsedRow {
            row,
            date: value_at(&record, columns.date.0),
            description: value_at(&record, columns.description.0),
            amount: value_at(&record, columns.amount.0),
            category: columns
                .category
                .as_ref()
                .and_then(|(index, _)| value_at(&record, *index)),
            malformed: None,
        });
    }

    Ok(ParsedSource { columns, rows })
}

pub(crate) fn detect_columns(headers: &[String]) -> ClientResult<DetectedColumns> {
    let date = find_column(headers, &DATE_HEADERS);
    let description = find_column(headers, &DESCRIPTION_HEADERS);
    let amount = find_column(headers, &AMOUNT_HEADERS);
    let category = find_column(headers, &CATEGORY_HEADERS);

    match (date, description, amount) {
        (Some(date), Some(description), Some(amount)) => Ok(DetectedColumns {
            date,
            description,
            amount,
            category,
        }),
        (date, description, amount) => {
            let mut missing = Vec::new();
            if date.is_none() {
                missing.push("date".to_string());
            }
            if description.is_none() {
                missing.push("description".to_string());
            }
            if amount.is_none() {
                missing.push("amount".to_string());
            }
            Err(ClientError::import_columns_not_detected(
                missing,
                headers.to_vec(),
            ))
        }
    }
}

/// Candidate order decides ties, not header order.
fn find_column(headers: &[String], candidates: &[&str]) -> Option<(usize, String)> {
    candidates.iter().find_map(|candidate| {
        headers
            .iter()
            .position(|header| header.to_lowercase() == *candidate)
            .map(|index| (index, headers[index].clone()))
    })
}

fn value_at(record: &csv::StringRecord, index: usize) -> Option<String> {
    record.get(index).map(str::to_string)
}
