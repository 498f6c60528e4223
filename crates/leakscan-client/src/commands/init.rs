use std::path::Path;

use crate::ClientResult;
use crate::commands::common::load_setup;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::InitData;

#[derive(Debug, Default)]
pub struct InitRunOptions<'a> {
    pub home_override: Option<&'a Path>,
}

pub fn run() -> ClientResult<SuccessEnvelope> {
    run_with_options(InitRunOptions::default())
}

#[doc(hidden)]
pub fn run_with_options(options: InitRunOptions<'_>) -> ClientResult<SuccessEnvelope> {
    let setup = load_setup(options.home_override)?;
    let data = InitData {
        db_path: setup.db_path.display().to_string(),
        schema_version: setup.schema_version,
        transaction_count: setup.transaction_count,
        data_range: setup.data_range,
    };
    success("init", data)
}
