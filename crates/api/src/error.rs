//! API Error Responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use data_validator::ValidationError;
use feature_engine::FeatureError;
use inference_engine::InferenceError;
use serde::Serialize;
use service_registry::RegistryError;
use thiserror::Error;
use tracing::warn;

/// Errors returned by handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "malformed_record"),
            ApiError::Registry(err) => match err {
                RegistryError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
                RegistryError::AlreadyExists { .. } => (StatusCode::CONFLICT, "already_exists"),
                RegistryError::InvalidName { .. } => (StatusCode::BAD_REQUEST, "invalid_name"),
                RegistryError::LockError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
                RegistryError::Feature(FeatureError::Validation(_)) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "malformed_record")
                }
                RegistryError::Feature(FeatureError::DuplicateAccount(_)) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "duplicate_account")
                }
                RegistryError::Feature(FeatureError::InvalidWindow { .. }) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "invalid_window")
                }
                RegistryError::Inference(InferenceError::SchemaMismatch { .. }) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "schema_mismatch")
                }
                RegistryError::Inference(
                    InferenceError::InvalidModel(_) | InferenceError::ModelLoadError(_),
                ) => (StatusCode::BAD_REQUEST, "invalid_model"),
                RegistryError::Inference(
                    InferenceError::InferenceFailed(_) | InferenceError::SerializationError(_),
                ) => (StatusCode::INTERNAL_SERVER_ERROR, "inference_failed"),
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status_and_kind().0
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        warn!(status = status.as_u16(), kind, error = %self, "Request failed");
        metrics::counter!("credit_risk_errors_total", "kind" => kind).increment(1);

        let payload = Json(ErrorResponse {
            error: self.to_string(),
            kind,
        });
        (status, payload).into_response()
    }
}
