//! Validation Error Types

use thiserror::Error;

/// Errors raised while ingesting raw tables
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A row holds a value that cannot be parsed into the record type
    #[error("Malformed record at row {row}: {field} {reason}")]
    MalformedRecord {
        row: usize,
        field: String,
        reason: String,
    },

    /// Required column absent from the input table
    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    /// Row width does not match the table header
    #[error("Row {row} has {actual} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

impl ValidationError {
    pub(crate) fn malformed(row: usize, field: &str, reason: impl Into<String>) -> Self {
        ValidationError::MalformedRecord {
            row,
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
