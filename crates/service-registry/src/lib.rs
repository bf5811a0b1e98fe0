//! Service Registry
//!
//! Publishes, versions, and serves credit-risk scoring snapshots through the
//! `ServiceHost` capability interface.

mod registry;
mod schema;
mod snapshot;

pub use registry::{InMemoryServiceHost, ServiceHost};
pub use schema::export_schema;
pub use snapshot::{ServiceInfo, ServiceSnapshot};

use feature_engine::FeatureError;
use inference_engine::InferenceError;
use thiserror::Error;

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Service {name}/{version} already exists")]
    AlreadyExists { name: String, version: String },
    #[error("Service {name}/{version} not found")]
    NotFound { name: String, version: String },
    #[error("Invalid service {kind} '{value}'")]
    InvalidName { kind: &'static str, value: String },
    #[error("Registry lock error: {0}")]
    LockError(String),
    #[error(transparent)]
    Feature(#[from] FeatureError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}
