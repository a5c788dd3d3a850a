//! Error types for isolation forest training and scoring.

use thiserror::Error;

/// Errors surfaced by forest construction and scoring.
///
/// Numeric degeneracies (zero-range splits, batches whose scores are all
/// equal) are resolved internally and never show up here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IsolationForestError {
    #[error("Invalid configuration: {name} - {reason}")]
    InvalidConfiguration { name: String, reason: String },

    #[error("Dimension mismatch at record {row}: expected {expected} features, got {got}")]
    DimensionMismatch {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("Non-finite value at row {row}, column {column}")]
    NonFiniteValue { row: usize, column: usize },
}

impl IsolationForestError {
    pub(crate) fn invalid_configuration(name: &str, reason: impl Into<String>) -> Self {
        IsolationForestError::InvalidConfiguration {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for isolation forest operations.
pub type Result<T> = std::result::Result<T, IsolationForestError>;
