//! Service Lifecycle Routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use feature_engine::FeatureConfig;
use inference_engine::GbdtClassifier;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use service_registry::ServiceInfo;

use crate::error::ApiError;
use crate::SharedState;

/// Body of a publish request
#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub name: String,
    pub version: String,
    pub model: GbdtClassifier,
    /// Falls back to the server's configured feature options
    #[serde(default)]
    pub features: Option<FeatureConfig>,
}

/// Body of an update request
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub model: GbdtClassifier,
}

/// Response for the list endpoint
#[derive(Debug, Serialize)]
pub struct ServiceListResponse {
    pub data: Vec<ServiceInfo>,
    pub count: usize,
}

/// List published services
pub async fn list_services(State(state): State<SharedState>) -> Result<Json<ServiceListResponse>, ApiError> {
    let registry = state.read().await.registry.clone();
    let data = registry.list()?;
    Ok(Json(ServiceListResponse {
        count: data.len(),
        data,
    }))
}

/// Publish a new service version
pub async fn publish_service(
    State(state): State<SharedState>,
    Json(request): Json<PublishRequest>,
) -> Result<(StatusCode, Json<ServiceInfo>), ApiError> {
    let (registry, features) = {
        let state = state.read().await;
        let features = request
            .features
            .unwrap_or_else(|| state.default_features.clone());
        (state.registry.clone(), features)
    };

    let info = registry.publish(&request.name, &request.version, request.model, features)?;
    metrics::counter!("credit_risk_publications_total").increment(1);
    Ok((StatusCode::CREATED, Json(info)))
}

/// Describe one service version
pub async fn get_service(
    State(state): State<SharedState>,
    Path((name, version)): Path<(String, String)>,
) -> Result<Json<ServiceInfo>, ApiError> {
    let registry = state.read().await.registry.clone();
    let snapshot = registry.get(&name, &version)?;
    Ok(Json(snapshot.info()))
}

/// Replace the artifact of a service version
pub async fn update_service(
    State(state): State<SharedState>,
    Path((name, version)): Path<(String, String)>,
    Json(request): Json<UpdateRequest>,
) -> Result<Json<ServiceInfo>, ApiError> {
    let registry = state.read().await.registry.clone();
    let info = registry.update(&name, &version, request.model)?;
    Ok(Json(info))
}

/// Remove a service version
pub async fn delete_service(
    State(state): State<SharedState>,
    Path((name, version)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let registry = state.read().await.registry.clone();
    registry.delete(&name, &version)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Swagger document of a service version
pub async fn get_swagger(
    State(state): State<SharedState>,
    Path((name, version)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let registry = state.read().await.registry.clone();
    Ok(Json(registry.export_schema(&name, &version)?))
}
