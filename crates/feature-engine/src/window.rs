//! Feature Window Resolution

use crate::error::FeatureError;
use chrono::{Months, NaiveDate};
use data_validator::TransactionRecord;
use serde::{Deserialize, Serialize};

/// Caller-supplied window bounds; anything unset is derived from the data
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// First day of the window (inclusive)
    pub start: Option<NaiveDate>,
    /// Last day of the window (inclusive), also the recency reference date
    pub end: Option<NaiveDate>,
    /// Window length in months, used when `start` is unset
    pub months: Option<u32>,
}

impl WindowConfig {
    /// Window of `months` ending at the latest transaction
    pub fn trailing_months(months: u32) -> Self {
        Self {
            months: Some(months),
            ..Self::default()
        }
    }

    /// Window with explicit bounds
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
            months: None,
        }
    }
}

/// Resolved, inclusive aggregation window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FeatureWindow {
    /// Resolve the window against a transaction batch.
    ///
    /// `end` falls back to the latest transaction date, `start` to
    /// `end - months` and then to the earliest transaction date. Returns
    /// `None` when nothing is configured and the batch is empty.
    pub fn resolve(
        config: &WindowConfig,
        transactions: &[TransactionRecord],
    ) -> Result<Option<Self>, FeatureError> {
        let latest = transactions.iter().map(|t| t.date).max();

        let Some(end) = config.end.or(latest).or(config.start) else {
            return Ok(None);
        };
        // Transactions after the end never reach the window
        let earliest = transactions.iter().map(|t| t.date).filter(|d| *d <= end).min();

        let start = config
            .start
            .or_else(|| {
                config
                    .months
                    .and_then(|m| end.checked_sub_months(Months::new(m)))
            })
            .or(earliest)
            .unwrap_or(end);

        if start > end {
            if config.start.is_some() && config.end.is_some() {
                return Err(FeatureError::InvalidWindow { start, end });
            }
            // Derived end precedes a configured start: empty window at start
            return Ok(Some(Self { start, end: start }));
        }

        Ok(Some(Self { start, end }))
    }

    /// Whether a date falls inside the window
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Window length in days
    pub fn length_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}
