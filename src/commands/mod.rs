//! CLI command implementations.
//!
//! Each command is implemented in its own module.
//! Commands orchestrate the various library components to perform user tasks.

pub mod models;
pub mod query;
pub mod report;
pub mod utils;

// Re-export main command functions
pub use models::{DecodeArgs, QueryArgs, ReportArgs};
pub use query::{execute_query, open_session, run_query, Query};
pub use report::{execute_report, validate_args};
pub use utils::{display_schema, display_version, validate_report_file};
