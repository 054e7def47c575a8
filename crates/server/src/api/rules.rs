use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::{info, warn};

use augur_core::{RuleRecord, RuleType};

use super::AppState;
use super::schemas::{ReloadResponse, RuleListQuery};

/// `GET /v1/rules` -- list the rules of the serving generation.
#[utoipa::path(
    get,
    path = "/v1/rules",
    tag = "Rules",
    summary = "List rules",
    description = "Returns the enabled, well-formed rules currently indexed, in id order.",
    params(RuleListQuery),
    responses(
        (status = 200, description = "Indexed rules", body = Vec<RuleRecord>)
    )
)]
pub async fn list_rules(
    State(state): State<AppState>,
    Query(query): Query<RuleListQuery>,
) -> Json<Vec<RuleRecord>> {
    let rule_type = query.rule_type.map(RuleType::new);
    Json(state.engine.list_rules(rule_type.as_ref()))
}

/// `POST /v1/rules/reload` -- rebuild the index from the store.
#[utoipa::path(
    post,
    path = "/v1/rules/reload",
    tag = "Rules",
    summary = "Reload rules",
    description = "Reads every enabled rule and swaps in a fresh index regardless of version.",
    responses(
        (status = 200, description = "Rules reloaded", body = ReloadResponse),
        (status = 503, description = "Store unreachable; the previous rule set keeps serving", body = ReloadResponse)
    )
)]
pub async fn reload_rules(State(state): State<AppState>) -> impl IntoResponse {
    let outcome = state.engine.reload_all().await;
    let status = if outcome.success {
        info!(
            version = outcome.version,
            rules = outcome.rule_count,
            malformed = outcome.malformed.len(),
            "rules reloaded"
        );
        StatusCode::OK
    } else {
        warn!(error = ?outcome.error, "forced reload failed");
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(ReloadResponse::from(outcome)))
}
