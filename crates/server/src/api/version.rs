use axum::Json;
use axum::extract::State;
use tracing::info;

use crate::error::ServerError;

use super::AppState;
use super::schemas::{ErrorResponse, StatusResponse, VersionCheckResponse};

/// `POST /v1/version/check` -- compare the loaded version with the store.
#[utoipa::path(
    post,
    path = "/v1/version/check",
    tag = "Version",
    summary = "Check version",
    description = "Reads the store's version counter and reloads the rule set if it moved.",
    responses(
        (status = 200, description = "Check completed", body = VersionCheckResponse),
        (status = 503, description = "Rule store unreachable; the previous rule set keeps serving", body = ErrorResponse)
    )
)]
pub async fn check_version(
    State(state): State<AppState>,
) -> Result<Json<VersionCheckResponse>, ServerError> {
    let check = state.engine.check_version().await?;
    if check.changed {
        info!(version = check.current_version, "rule set updated by explicit check");
    }
    Ok(Json(check.into()))
}

/// `GET /v1/version/status` -- loaded version and tracker bookkeeping.
#[utoipa::path(
    get,
    path = "/v1/version/status",
    tag = "Version",
    summary = "Engine status",
    description = "Returns the loaded version, tracker state, last reload time and last error.",
    responses(
        (status = 200, description = "Current status", body = StatusResponse)
    )
)]
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(state.engine.status().into())
}
