//! Feature Builder Errors

use chrono::NaiveDate;
use data_validator::ValidationError;
use thiserror::Error;

/// Errors during feature building. Every variant describes malformed input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Duplicate demographic record for account {0}")]
    DuplicateAccount(String),
    #[error("Invalid feature window: start {start} is after end {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },
}
