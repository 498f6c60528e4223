use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::intelligence::types::AnalysisFilter;
use crate::{ClientError, ClientResult};

/// Statement date layouts tried in order after the strict ISO form.
const STATEMENT_DATE_FORMATS: [&str; 3] = ["%m/%d/%Y", "%Y/%m/%d", "%m/%d/%y"];

const STATEMENT_DATETIME_FORMATS: [&str; 3] =
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

pub fn build_filter(
    account: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
    command: &str,
) -> ClientResult<AnalysisFilter> {
    let parsed_from = match from {
        Some(value) => Some(parse_iso_date_strict(value, "from", command)?),
        None => None,
    };
    let parsed_to = match to {
        Some(value) => Some(parse_iso_date_strict(value, "to", command)?),
        None => None,
    };

    if let (Some(start), Some(end)) = (parsed_from, parsed_to)
        && start > end
    {
        return Err(ClientError::invalid_argument_for_command(
            "Invalid date range: `from` must be on or before `to`.",
            Some(command),
        ));
    }

    let account = match account.map(str::trim) {
        Some("") => {
            return Err(ClientError::invalid_argument_for_command(
                "`account` must not be empty.",
                Some(command),
            ));
        }
        Some(value) => Some(value.to_string()),
        None => None,
    };

    Ok(AnalysisFilter {
        account,
        from: parsed_from,
        to: parsed_to,
    })
}

pub fn format_iso_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parses the `YYYY-MM-DD` form stored in the ledger.
pub fn parse_transaction_date(value: &str) -> Option<NaiveDate> {
    if !looks_like_iso_date(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Parses the date layouts banks commonly export. Time-of-day parts are
/// dropped. US month-first order wins over day-first for slash dates.
pub fn parse_statement_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(date) = parse_transaction_date(trimmed) {
        return Some(date);
    }

    for format in STATEMENT_DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(parsed.date());
        }
    }

    for format in STATEMENT_DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, format)
            && plausible_year(parsed)
        {
            return Some(parsed);
        }
    }
    None
}

// `%Y` happily accepts two-digit years as year 0025.
fn plausible_year(date: NaiveDate) -> bool {
    (1900..=2200).contains(&date.year())
}

fn parse_iso_date_strict(value: &str, field_name: &str, command: &str) -> ClientResult<NaiveDate> {
    if !looks_like_iso_date(value) {
        return Err(ClientError::invalid_argument_for_command(
            &format!("`{field_name}` must use YYYY-MM-DD format with a real calendar date."),
            Some(command),
        ));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        ClientError::invalid_argument_for_command(
            &format!("`{field_name}` must use YYYY-MM-DD format with valid calendar values."),
            Some(command),
        )
    })
}

fn looks_like_iso_date(value: &str) -> bool {
    if value.len() != 10 {
        return false;
    }
    let bytes = value.as_bytes();
    if bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }

    for index in [0usize, 1, 2, 3, 5, 6, 8, 9] {
        if !bytes[index].is_ascii_digit() {
            return false;
        }
    }
    true
}
