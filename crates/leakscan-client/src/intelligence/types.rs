use chrono::NaiveDate;

#[derive(Debug, Clone, Default)]
pub struct AnalysisFilter {
    pub account: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// One validated ledger row.
///
/// `merchant` is already normalized at ingestion time; detectors never
/// re-normalize it.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    pub merchant: String,
    pub amount: f64,
    pub category: Option<String>,
    pub account: String,
}

/// The slice of a transaction the detectors operate on, with the sign
/// convention already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct SpendRecord {
    pub date: NaiveDate,
    pub merchant: String,
    pub spend: f64,
}
