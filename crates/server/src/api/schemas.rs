use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use augur_cache::CacheMetricsSnapshot;
use augur_core::MatchedRule;
use augur_engine::{EngineMetricsSnapshot, EngineStatus, MatchResult, ReloadOutcome, VersionCheck};
use augur_rules::MalformedRule;

/// Request body for `POST /v1/match`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MatchRequestBody {
    /// Flat map of subject facts; values are scalars or lists of scalars.
    #[schema(value_type = Object)]
    pub facts: serde_json::Value,
    /// Restrict matching to these rule types. Omitted or empty means all.
    #[serde(default)]
    pub rule_types: Option<Vec<String>>,
    /// Order by weighted score instead of priority.
    #[serde(default)]
    pub ranked: bool,
    /// Audience segment applied to the ranked score.
    #[serde(default)]
    #[schema(example = "vip")]
    pub segment: Option<String>,
}

/// Rules that apply to the submitted facts.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MatchResponse {
    /// Selected rules in output order.
    pub matched_rules: Vec<MatchedRule>,
    /// Number of selected rules.
    #[schema(example = 3)]
    pub rule_count: usize,
    /// Rule-set version the result was computed against.
    #[schema(example = 42)]
    pub version: u64,
}

impl From<MatchResult> for MatchResponse {
    fn from(result: MatchResult) -> Self {
        Self {
            matched_rules: result.matched_rules,
            rule_count: result.rule_count,
            version: result.version,
        }
    }
}

/// Result of an explicit version check.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VersionCheckResponse {
    /// Whether a newer rule set was loaded by this check.
    pub changed: bool,
    /// Version serving requests after the check.
    #[schema(example = 42)]
    pub current_version: u64,
}

impl From<VersionCheck> for VersionCheckResponse {
    fn from(check: VersionCheck) -> Self {
        Self {
            changed: check.changed,
            current_version: check.current_version,
        }
    }
}

/// A stored rule excluded from the index.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MalformedRuleResponse {
    pub id: i64,
    #[schema(example = "BROKEN_RULE")]
    pub code: String,
    /// Compilation error, with the JSON path of the offending node.
    #[schema(example = "malformed condition at $.all: 'all' expects an array, got string")]
    pub reason: String,
}

impl From<MalformedRule> for MalformedRuleResponse {
    fn from(m: MalformedRule) -> Self {
        Self {
            id: m.id,
            code: m.code,
            reason: m.reason,
        }
    }
}

/// Result of a forced reload.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReloadResponse {
    /// Whether a fresh rule set was read and installed.
    pub success: bool,
    /// Version serving requests after the attempt.
    #[schema(example = 42)]
    pub version: u64,
    /// Number of indexed rules.
    pub rule_count: usize,
    pub malformed: Vec<MalformedRuleResponse>,
    /// Store error when the reload failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<ReloadOutcome> for ReloadResponse {
    fn from(outcome: ReloadOutcome) -> Self {
        Self {
            success: outcome.success,
            version: outcome.version,
            rule_count: outcome.rule_count,
            malformed: outcome.malformed.into_iter().map(Into::into).collect(),
            error: outcome.error,
        }
    }
}

/// Engine status for operators.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    /// Loaded rule-set version.
    #[schema(example = 42)]
    pub version: u64,
    pub rule_count: usize,
    pub rule_types: Vec<String>,
    /// Codes of rules excluded from the current generation.
    pub malformed_codes: Vec<String>,
    /// `idle`, `checking` or `reloading`.
    #[schema(example = "idle")]
    pub tracker_state: String,
    pub last_reload_at: Option<DateTime<Utc>>,
    pub last_checked_at: Option<DateTime<Utc>>,
    /// Error of the last failed check or reload; cleared on success.
    pub last_error: Option<String>,
    /// Registered query adapters.
    pub adapters: Vec<String>,
}

impl From<EngineStatus> for StatusResponse {
    fn from(status: EngineStatus) -> Self {
        Self {
            version: status.version,
            rule_count: status.rule_count,
            rule_types: status
                .rule_types
                .into_iter()
                .map(|t| t.as_str().to_owned())
                .collect(),
            malformed_codes: status.malformed_codes,
            tracker_state: status.tracker_state.as_str().to_owned(),
            last_reload_at: status.last_reload_at,
            last_checked_at: status.last_checked_at,
            last_error: status.last_error,
            adapters: status.adapters,
        }
    }
}

/// Query parameters for `GET /v1/rules`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RuleListQuery {
    /// Only list rules of this type.
    #[serde(rename = "type")]
    pub rule_type: Option<String>,
}

/// Service health with a metrics snapshot.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status indicator.
    #[schema(example = "ok")]
    pub status: String,
    /// Loaded rule-set version.
    pub version: u64,
    pub metrics: MetricsResponse,
}

/// Engine and cache counters.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MetricsResponse {
    /// Match requests received.
    pub matches: u64,
    /// Match requests that timed out.
    pub match_timeouts: u64,
    pub version_checks: u64,
    /// Successful index swaps.
    pub reloads: u64,
    /// Reload attempts that kept the previous index.
    pub reload_failures: u64,
    /// Dynamic contents served from their default.
    pub adapter_fallbacks: u64,
    /// Malformed rules in the current generation.
    pub malformed_rules: u64,
    pub stats_flushes: u64,
    pub cache_l1_hits: u64,
    pub cache_l1_misses: u64,
    pub cache_l2_hits: u64,
    pub cache_l2_misses: u64,
    /// Shared tier operations that failed and were absorbed.
    pub cache_l2_errors: u64,
    /// Match computations actually run.
    pub cache_computations: u64,
    /// Requests that joined a computation already in flight.
    pub cache_coalesced: u64,
    pub cache_invalidations: u64,
}

impl MetricsResponse {
    pub fn from_snapshots(engine: &EngineMetricsSnapshot, cache: &CacheMetricsSnapshot) -> Self {
        Self {
            matches: engine.matches,
            match_timeouts: engine.match_timeouts,
            version_checks: engine.version_checks,
            reloads: engine.reloads,
            reload_failures: engine.reload_failures,
            adapter_fallbacks: engine.adapter_fallbacks,
            malformed_rules: engine.malformed_rules,
            stats_flushes: engine.stats_flushes,
            cache_l1_hits: cache.l1_hits,
            cache_l1_misses: cache.l1_misses,
            cache_l2_hits: cache.l2_hits,
            cache_l2_misses: cache.l2_misses,
            cache_l2_errors: cache.l2_errors,
            cache_computations: cache.computations,
            cache_coalesced: cache.coalesced,
            cache_invalidations: cache.invalidations,
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message.
    #[schema(example = "bad request: expected a JSON object, got array")]
    pub error: String,
}
