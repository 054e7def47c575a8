use axum::Json;
use axum::extract::State;

use augur_core::{FactContext, RuleType};
use augur_engine::MatchRequest;

use crate::error::ServerError;

use super::AppState;
use super::schemas::{ErrorResponse, MatchRequestBody, MatchResponse};

/// `POST /v1/match` -- find the rules that apply to a fact context.
#[utoipa::path(
    post,
    path = "/v1/match",
    tag = "Match",
    summary = "Match facts",
    description = "Evaluates the current rule set against the submitted facts and returns the selected rules with resolved content.",
    request_body(content = MatchRequestBody, description = "Facts and selection options"),
    responses(
        (status = 200, description = "Matched rules", body = MatchResponse),
        (status = 400, description = "Facts are not a flat map of scalars", body = ErrorResponse),
        (status = 504, description = "Match did not complete in time", body = ErrorResponse)
    )
)]
pub async fn match_facts(
    State(state): State<AppState>,
    Json(body): Json<MatchRequestBody>,
) -> Result<Json<MatchResponse>, ServerError> {
    let facts =
        FactContext::from_json(body.facts).map_err(|e| ServerError::BadRequest(e.to_string()))?;
    let request = MatchRequest {
        rule_types: body
            .rule_types
            .map(|types| types.into_iter().map(RuleType::new).collect()),
        ranked: body.ranked,
        segment: body.segment,
    };

    let result = state.engine.match_with(&facts, &request).await?;
    Ok(Json(result.into()))
}
