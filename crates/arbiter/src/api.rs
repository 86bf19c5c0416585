//! HTTP surface: health checks, Prometheus metrics, and the cycle
//! driver endpoints used by the predictor and conflict detector

use arbiter_lib::health::ComponentStatus;
use arbiter_lib::models::ResourceAllocation;
use arbiter_lib::{CapacityEngine, HealthRegistry};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health: HealthRegistry,
    pub engine: Arc<CapacityEngine>,
}

/// One adaptation cycle request from the external driver
#[derive(Debug, Deserialize)]
pub struct AdaptRequest {
    pub cpu_millis: u64,
    pub memory_bytes: u64,
    #[serde(default)]
    pub conflicting_resources: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ScheduleResponse {
    disabled: bool,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health.health().await;
    let status_code = match health.status {
        ComponentStatus::Healthy | ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(health))
}

async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health.readiness().await;
    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status_code, Json(readiness))
}

async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            e.to_string().into_bytes(),
        );
    }
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
}

async fn adapt(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AdaptRequest>,
) -> impl IntoResponse {
    let allocation = ResourceAllocation::new(request.cpu_millis, request.memory_bytes);
    match state
        .engine
        .adapt_and_apply(allocation, &request.conflicting_resources)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn schedule_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ScheduleResponse {
        disabled: state.engine.is_schedule_disabled().await,
    })
}

async fn disable_schedule(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.engine.disable_scheduling().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn enable_schedule(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.engine.enable_scheduling().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/v1/adapt", post(adapt))
        .route("/v1/schedule", get(schedule_state))
        .route("/v1/schedule/disable", post(disable_schedule))
        .route("/v1/schedule/enable", post(enable_schedule))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
