#![recursion_limit = "256"]
// Public fallible APIs in this crate share one concrete error contract (`Error`).
// Repeating per-function `# Errors` boilerplate obscures behavior more than it clarifies.
#![allow(
    clippy::missing_errors_doc,
    reason = "crate-wide fallible API uses one explicit error type; per-item boilerplate would duplicate contract"
)]

pub mod error;
pub mod models;
pub mod normalize;
pub mod persist;
pub mod schema;
pub mod writer;

pub use error::{ReportDbError, Result};
pub use models::TestRun;
pub use writer::{StagedWriter, Statement};
