//! Traffic Signal API Server
//!
//! REST API for the traffic signal snapshot service: accepts an optional
//! camera frame, runs object detection, and returns per-lane signal
//! assignments derived from relative occupancy.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod config;
pub mod error;
pub mod rate_limit;
pub mod routes;

use crate::config::ServerConfig;
use detection::{Detector, YoloDetector};

/// Application state shared across handlers.
///
/// The detector is constructed once at startup and injected by reference
/// into every request; when initialization fails, the slot stays empty and
/// requests get a structured error until restart.
pub struct AppState {
    /// Detection collaborator; None when initialization failed
    pub detector: Option<Arc<dyn Detector>>,
    /// Server configuration
    pub config: ServerConfig,
    /// Prometheus render handle
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create new application state, constructing the detector once
    pub fn new(config: ServerConfig, metrics: Option<PrometheusHandle>) -> Self {
        let detector = match YoloDetector::new(config.detector.clone()) {
            Ok(d) => Some(Arc::new(d) as Arc<dyn Detector>),
            Err(e) => {
                error!("Detector initialization failed: {}", e);
                None
            }
        };

        Self {
            detector,
            config,
            metrics,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub detector: ComponentHealth,
}

/// Individual component health
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: String,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let max_upload = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(routes::traffic::index))
        .route("/api/traffic", post(routes::traffic::process_frame))
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/metrics", get(metrics_handler))
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let detector_status = if state.detector.is_some() {
        "ok"
    } else {
        "unavailable"
    };

    let response = HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        detector: ComponentHealth {
            status: detector_status.to_string(),
        },
    };

    Json(response)
}

/// Prometheus metrics handler
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Install the Prometheus metrics recorder
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Failed to install metrics recorder: {}", e);
            None
        }
    }
}

/// Run the server
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let metrics = init_metrics();
    let state = Arc::new(AppState::new(config.clone(), metrics));

    let governor_config = rate_limit::create_governor_config(&config.rate_limit);
    let app = create_router(state).layer(tower_governor::GovernorLayer {
        config: governor_config,
    });

    info!("Starting API server on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_without_model_gets_mock_detector() {
        let state = AppState::new(ServerConfig::default(), None);
        assert!(state.detector.is_some());
    }

    #[test]
    fn test_state_with_bad_model_path_has_no_detector() {
        let mut config = ServerConfig::default();
        config.detector.model_path = Some("/nonexistent/model.onnx".to_string());
        let state = AppState::new(config, None);
        assert!(state.detector.is_none());
    }

    #[test]
    fn test_router_builds() {
        let state = Arc::new(AppState::new(ServerConfig::default(), None));
        let _router = create_router(state);
    }
}
