//! Vision Assistant API Server
//!
//! REST and WebSocket endpoints for submitting images to the detector.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use perception::{DetectionStage, ObjectDetector, ZoneClassifier};
use pipeline::{build_detector, ApiConfig, AssistConfig};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

mod error;
pub mod rate_limit;
pub mod routes;

pub use error::{ApiError, ErrorBody, PROCESSING_ERROR};
pub use rate_limit::{create_governor_config, RateLimitConfig};

/// Application state shared across handlers
pub struct AppState {
    /// Detector with the API acceptance threshold
    pub detection: DetectionStage,
    pub classifier: ZoneClassifier,
    pub settings: ApiConfig,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    /// Prometheus exporter; `/metrics` is 404 without it
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(detector: Arc<dyn ObjectDetector>, config: &AssistConfig) -> Self {
        Self {
            detection: DetectionStage::new(detector, config.api.confidence_threshold),
            classifier: ZoneClassifier::new(config.zones.clone()),
            settings: config.api.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub detector: String,
    pub confidence_threshold: f32,
}

/// Create the application router, rate limited when `rate_limit` is given
pub fn create_router(state: Arc<AppState>, rate_limit: Option<&RateLimitConfig>) -> Router {
    let submissions = Router::new()
        .route("/api/v1/detect", post(routes::detect::detect_image))
        .route("/api/v1/realtime/frame", post(routes::realtime::post_frame));
    let submissions = match rate_limit.and_then(create_governor_config) {
        Some(config) => submissions.layer(GovernorLayer { config }),
        None => submissions,
    };

    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/realtime", get(routes::realtime::ws_handler))
        .route("/metrics", get(metrics_handler))
        .merge(submissions)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        detector: state.detection.detector().name().to_string(),
        confidence_threshold: state.detection.threshold(),
    })
}

/// Prometheus text exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics exporter not installed".to_string()),
    }
}

/// Run the server until interrupted
pub async fn run_server(config: AssistConfig) -> Result<(), Box<dyn std::error::Error>> {
    let detector = build_detector(&config.detector)?;
    let handle = PrometheusBuilder::new().install_recorder()?;
    let state = Arc::new(AppState::new(detector, &config).with_metrics(handle));

    let rate_limit = RateLimitConfig::from_settings(&config.api);
    let app = create_router(state, rate_limit.as_ref());

    info!("Starting API server on {}", config.api.addr);

    let listener = tokio::net::TcpListener::bind(&config.api.addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down API server");
        })
        .await?;

    Ok(())
}
