#![allow(clippy::needless_for_each)]

use augur_core::{ContentSource, MatchedRule, RuleRecord};

use super::schemas::{
    ErrorResponse, HealthResponse, MalformedRuleResponse, MatchRequestBody, MatchResponse,
    MetricsResponse, ReloadResponse, StatusResponse, VersionCheckResponse,
};

#[derive(utoipa::OpenApi)]
#[openapi(
    info(
        title = "Augur Rule Matching API",
        version = "0.1.0",
        description = "HTTP API for the Augur rule engine. Match facts against the current rule set, trigger reloads and monitor freshness.",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "Health", description = "Service health and metrics"),
        (name = "Match", description = "Rule matching against subject facts"),
        (name = "Version", description = "Rule-set version tracking"),
        (name = "Rules", description = "Inspection and reload of the indexed rule set")
    ),
    paths(
        super::health::health,
        super::health::metrics,
        super::matching::match_facts,
        super::version::check_version,
        super::version::status,
        super::rules::list_rules,
        super::rules::reload_rules,
    ),
    components(schemas(
        ContentSource,
        ErrorResponse,
        HealthResponse,
        MalformedRuleResponse,
        MatchRequestBody,
        MatchResponse,
        MatchedRule,
        MetricsResponse,
        ReloadResponse,
        RuleRecord,
        StatusResponse,
        VersionCheckResponse,
    ))
)]
pub struct ApiDoc;
