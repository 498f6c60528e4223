pub mod creep;
pub mod date;
pub mod normalize;
pub mod policy;
pub mod query;
pub mod recurring;
pub mod spend;
pub(crate) mod stats;
pub mod trial;
pub mod types;
