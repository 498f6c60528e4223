use std::path::Path;

use crate::ClientResult;
use crate::contracts::types::DataRangeHint;
use crate::intelligence::query::LedgerDataRange;
use crate::setup::{SetupContext, ensure_initialized, ensure_initialized_at};

pub(crate) fn load_setup(home_override: Option<&Path>) -> ClientResult<SetupContext> {
    if let Some(home) = home_override {
        return ensure_initialized_at(home);
    }
    ensure_initialized()
}

/// Tells the caller which dates hold data when a filter found nothing.
pub fn data_range_hint(data_range: LedgerDataRange) -> DataRangeHint {
    DataRangeHint {
        earliest: data_range.earliest,
        latest: data_range.latest,
        transaction_count: data_range.transaction_count,
    }
}
