//! Credit Risk API Server
//!
//! REST API for publishing versioned credit-risk services and calling their
//! feature and scoring operations.

use anyhow::Context;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use feature_engine::FeatureConfig;
use inference_engine::GbdtClassifier;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use service_registry::{InMemoryServiceHost, ServiceHost};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_governor::GovernorLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
pub mod error;
pub mod rate_limit;
mod routes;

pub use config::{BootstrapService, LoggingConfig, ServerConfig, ServiceConfig};
pub use error::ApiError;
pub use rate_limit::RateLimitConfig;

/// Application state shared across handlers
pub struct AppState {
    /// Published services
    pub registry: Arc<dyn ServiceHost>,
    /// Feature options for services published without their own
    pub default_features: FeatureConfig,
    /// Prometheus recorder, when installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(registry: Arc<dyn ServiceHost>, default_features: FeatureConfig) -> Self {
        Self {
            registry,
            default_features,
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }

    /// Serve Prometheus metrics from `handle`
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(InMemoryServiceHost::new()), FeatureConfig::default())
    }
}

/// State handed to every handler
pub type SharedState = Arc<RwLock<AppState>>;

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub services: usize,
}

/// Create the application router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route(
            "/api/v1/services",
            get(routes::services::list_services).post(routes::services::publish_service),
        )
        .route(
            "/api/v1/services/:name/:version",
            get(routes::services::get_service)
                .put(routes::services::update_service)
                .delete(routes::services::delete_service),
        )
        .route(
            "/api/v1/services/:name/:version/swagger.json",
            get(routes::services::get_swagger),
        )
        .route(
            "/api/v1/services/:name/:version/features",
            post(routes::pipeline::build_features),
        )
        .route("/api/v1/services/:name/:version/score", post(routes::pipeline::score))
        .route("/api/v1/services/:name/:version/predict", post(routes::pipeline::predict))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let state = state.read().await;
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let (status, services) = match state.registry.list() {
        Ok(services) => ("healthy", services.len()),
        Err(_) => ("degraded", 0),
    };

    Json(HealthResponse {
        status: status.to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        services,
    })
}

/// Prometheus text exposition
async fn metrics_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let state = state.read().await;
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        ),
        None => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/plain")],
            "metrics recorder not installed".to_string(),
        ),
    }
}

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let level = config.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder().with_max_level(level).with_target(true);

    let result = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.context("Failed to set tracing subscriber")
}

/// Publish the configured startup service, if any
pub fn bootstrap(registry: &dyn ServiceHost, config: &ServiceConfig) -> anyhow::Result<()> {
    let Some(service) = &config.bootstrap else {
        return Ok(());
    };
    let artifact = GbdtClassifier::from_json_file(&service.model_path)
        .with_context(|| format!("Failed to load model for {}/{}", service.name, service.version))?;
    registry
        .publish(&service.name, &service.version, artifact, config.features.clone())
        .with_context(|| format!("Failed to publish {}/{}", service.name, service.version))?;
    Ok(())
}

/// Run the server
pub async fn run_server(config: ServiceConfig) -> anyhow::Result<()> {
    let registry: Arc<dyn ServiceHost> = Arc::new(InMemoryServiceHost::new());
    bootstrap(registry.as_ref(), &config)?;

    let recorder = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    let state = AppState::new(registry, config.features.clone()).with_metrics(recorder);

    let mut app = create_router(Arc::new(RwLock::new(state)))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());
    if config.rate_limit.enabled {
        let governor = rate_limit::create_governor_config(&config.rate_limit)?;
        app = app.layer(GovernorLayer { config: governor });
    }

    let addr = config.server.address();
    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("API server terminated unexpectedly")?;

    Ok(())
}
