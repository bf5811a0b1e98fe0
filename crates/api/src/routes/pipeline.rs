//! Feature and Scoring Routes
//!
//! Tables travel as JSON record arrays. Each call resolves the snapshot once,
//! so a concurrent update never mixes two artifacts within one request.

use axum::{
    extract::{Path, State},
    Json,
};
use data_validator::Table;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::debug;

use crate::error::ApiError;
use crate::SharedState;

/// Raw input tables
#[derive(Debug, Deserialize)]
pub struct FeatureRequest {
    #[serde(default)]
    pub transactions: Vec<Value>,
    #[serde(default)]
    pub demographics: Vec<Value>,
}

/// Feature table
#[derive(Debug, Serialize)]
pub struct FeatureResponse {
    pub features: Vec<Value>,
    pub count: usize,
}

/// Feature table to score
#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    #[serde(default)]
    pub features: Vec<Value>,
}

/// Prediction table
#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub predictions: Vec<Value>,
    pub count: usize,
}

fn record(operation: &'static str, rows: usize, start: Instant) {
    let elapsed = start.elapsed();
    metrics::counter!("credit_risk_requests_total", "operation" => operation).increment(1);
    metrics::counter!("credit_risk_rows_total", "operation" => operation).increment(rows as u64);
    metrics::histogram!("credit_risk_request_duration_seconds", "operation" => operation)
        .record(elapsed.as_secs_f64());
    debug!(operation, rows, elapsed_us = elapsed.as_micros() as u64, "Request served");
}

/// Build features for raw tables
pub async fn build_features(
    State(state): State<SharedState>,
    Path((name, version)): Path<(String, String)>,
    Json(request): Json<FeatureRequest>,
) -> Result<Json<FeatureResponse>, ApiError> {
    let start = Instant::now();
    let registry = state.read().await.registry.clone();
    let snapshot = registry.get(&name, &version)?;

    let transactions = Table::from_records(&request.transactions)?;
    let demographics = Table::from_records(&request.demographics)?;
    let features = snapshot.build_features(&transactions, &demographics)?;

    record("features", features.len(), start);
    Ok(Json(FeatureResponse {
        count: features.len(),
        features: features.to_records(),
    }))
}

/// Score a feature table
pub async fn score(
    State(state): State<SharedState>,
    Path((name, version)): Path<(String, String)>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let start = Instant::now();
    let registry = state.read().await.registry.clone();
    let snapshot = registry.get(&name, &version)?;

    let features = Table::from_records(&request.features)?;
    let predictions = snapshot.score(&features)?;

    record("score", predictions.len(), start);
    Ok(Json(ScoreResponse {
        count: predictions.len(),
        predictions: predictions.to_records(),
    }))
}

/// Build features and score them
pub async fn predict(
    State(state): State<SharedState>,
    Path((name, version)): Path<(String, String)>,
    Json(request): Json<FeatureRequest>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let start = Instant::now();
    let registry = state.read().await.registry.clone();
    let snapshot = registry.get(&name, &version)?;

    let transactions = Table::from_records(&request.transactions)?;
    let demographics = Table::from_records(&request.demographics)?;
    let predictions = snapshot.predict(&transactions, &demographics)?;

    record("predict", predictions.len(), start);
    Ok(Json(ScoreResponse {
        count: predictions.len(),
        predictions: predictions.to_records(),
    }))
}
