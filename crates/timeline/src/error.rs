//! Timeline error types.

use thiserror::Error;

pub type TimelineResult<T> = Result<T, TimelineError>;

/// Ingestion-time validation errors. Everything downstream of a successfully
/// parsed action fails soft (warn and skip) instead of raising.
#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("action {action}: missing required field `{field}`")]
    MissingField {
        action: &'static str,
        field: &'static str,
    },

    #[error("action {action}: field `{field}` {reason}")]
    InvalidField {
        action: &'static str,
        field: &'static str,
        reason: &'static str,
    },
}
