//! Prediction Records

use data_validator::{Cell, Table};
use feature_engine::ACCOUNT_ID_COLUMN;
use serde::{Deserialize, Serialize};

/// Predicted binary label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictedLabel {
    NoDefault,
    Default,
}

impl PredictedLabel {
    /// Label for a probability; strictly above the threshold is default
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        if probability > threshold {
            PredictedLabel::Default
        } else {
            PredictedLabel::NoDefault
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictedLabel::NoDefault => "no_default",
            PredictedLabel::Default => "default",
        }
    }
}

/// One scored account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub account_id: String,
    pub label: PredictedLabel,
    /// Probability of default, in [0, 1]
    pub probability: f64,
}

/// Columns of a prediction table
pub const PREDICTION_COLUMNS: [&str; 3] = [ACCOUNT_ID_COLUMN, "predicted_label", "default_probability"];

/// Convert predictions into a prediction table
pub fn predictions_to_table(predictions: &[PredictionRecord]) -> Table {
    let rows = predictions.iter().map(|p| {
        vec![
            Cell::Text(p.account_id.clone()),
            Cell::from(p.label.as_str()),
            Cell::Number(p.probability),
        ]
    });
    // Every row has exactly PREDICTION_COLUMNS cells
    Table::with_rows(PREDICTION_COLUMNS, rows).unwrap_or_else(|_| Table::new(PREDICTION_COLUMNS))
}
