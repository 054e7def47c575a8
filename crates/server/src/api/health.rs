use axum::Json;
use axum::extract::State;

use super::AppState;
use super::schemas::{HealthResponse, MetricsResponse};

fn build_metrics_response(state: &AppState) -> MetricsResponse {
    MetricsResponse::from_snapshots(
        &state.engine.metrics().snapshot(),
        &state.engine.cache_metrics().snapshot(),
    )
}

/// `GET /health` -- returns service status together with a metrics snapshot.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    summary = "Health check",
    description = "Returns service status, the loaded rule version and a snapshot of engine metrics.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: state.engine.version(),
        metrics: build_metrics_response(&state),
    })
}

/// `GET /metrics` -- returns engine and cache metrics as JSON.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    summary = "Engine metrics",
    description = "Returns current match, reload and cache counters for monitoring.",
    responses(
        (status = 200, description = "Current metric counters", body = MetricsResponse)
    )
)]
pub async fn metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(build_metrics_response(&state))
}
