use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{RuleCode, RuleType};

/// Where the content of a matched rule came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    /// The rule's own static content (text or description items).
    Static,
    /// Output of a query adapter.
    Adapter,
    /// The dynamic block's `default_content`, used after adapter failure.
    Default,
}

/// A rule selected by a match, with its resolved content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MatchedRule {
    /// Rule id.
    pub id: i64,
    /// Rule code.
    pub code: RuleCode,
    /// Display name.
    pub name: String,
    /// Rule category.
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    /// Rule priority.
    pub priority: i32,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Rule tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Weighted score, present only for ranked matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Resolved content payload.
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub content: Value,
    /// Origin of `content`.
    pub content_source: ContentSource,
}

/// The ordered result of one match computation, as stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSet {
    /// Rule-set version the result was computed against.
    pub version: u64,
    /// Selected rules in output order.
    pub rules: Vec<MatchedRule>,
}

impl MatchSet {
    /// Number of selected rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
