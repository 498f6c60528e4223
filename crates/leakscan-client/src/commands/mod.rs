pub mod analyze;
pub mod common;
pub mod import;
pub mod init;
pub mod report;
