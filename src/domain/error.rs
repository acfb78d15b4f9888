//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent record-level rule violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("blocker {id}: missing required parameter '{key}'")]
    MissingParameter { id: i64, key: String },
}
