use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct DataRange {
    pub earliest: Option<String>,
    pub latest: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InitData {
    pub db_path: String,
    pub schema_version: String,
    pub transaction_count: i64,
    pub data_range: DataRange,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportColumnMapping {
    pub date: String,
    pub description: String,
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub rows_read: i64,
    pub rows_imported: i64,
    pub rows_skipped: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportIssue {
    pub row: i64,
    pub field: String,
    pub code: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportData {
    pub dry_run: bool,
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_id: Option<String>,
    pub account: String,
    pub message: String,
    pub summary: ImportSummary,
    pub sign_convention: String,
    pub columns: ImportColumnMapping,
    pub issues: Vec<ImportIssue>,
    pub issues_truncated: bool,
    pub data_range: DataRange,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportListItem {
    pub import_id: String,
    pub account: String,
    pub created_at: String,
    pub rows_read: i64,
    pub rows_imported: i64,
    pub rows_skipped: i64,
    pub sign_convention: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportListData {
    pub rows: Vec<ImportListItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecurringRow {
    pub merchant: String,
    pub count: i64,
    pub typical_amount: f64,
    pub last_date: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceCreepRow {
    pub merchant: String,
    pub old_median: f64,
    pub new_median: f64,
    pub increase_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrialToPaidRow {
    pub merchant: String,
    pub trial_date: String,
    pub trial_amount: f64,
    pub paid_date: String,
    pub paid_amount: f64,
    pub days_between: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataRangeHint {
    pub earliest: Option<String>,
    pub latest: Option<String>,
    pub transaction_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisData {
    pub policy_version: String,
    pub account: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub trial_matching: String,
    pub recurring: Vec<RecurringRow>,
    pub price_creep: Vec<PriceCreepRow>,
    pub trial_to_paid: Vec<TrialToPaidRow>,
    pub data_range_hint: DataRangeHint,
}

/// Single-detector result; `rows` holds one of the `*Row` types.
#[derive(Debug, Clone, Serialize)]
pub struct DetectorData<T> {
    pub policy_version: String,
    pub account: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub rows: Vec<T>,
    pub data_range_hint: DataRangeHint,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    pub path: String,
    pub account: String,
    pub generated_at: String,
    pub recurring_count: i64,
    pub price_creep_count: i64,
    pub trial_to_paid_count: i64,
}
