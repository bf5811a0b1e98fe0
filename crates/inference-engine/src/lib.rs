//! Credit Default Scoring
//!
//! Applies a pretrained binary classifier to account feature rows and emits
//! one prediction per row, in input order.

mod classifier;
mod engine;
mod gbdt;
mod prediction;

pub use classifier::{Classifier, FeatureLookup, ModelFeature, ModelFeatureKind, ModelSchema, DEFAULT_THRESHOLD};
pub use engine::{score, Scorer};
pub use gbdt::{DecisionNode, GbdtClassifier, GbdtTree};
pub use prediction::{predictions_to_table, PredictedLabel, PredictionRecord, PREDICTION_COLUMNS};

use thiserror::Error;

/// Errors during scoring
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("Schema mismatch for account {account}: {field} {reason}")]
    SchemaMismatch {
        account: String,
        field: String,
        reason: String,
    },
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Invalid model: {0}")]
    InvalidModel(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}
