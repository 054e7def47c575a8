use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{RuleCode, RuleType};

fn default_enabled() -> bool {
    true
}

fn default_confidence_prior() -> f64 {
    0.5
}

fn default_biz_impact_weight() -> f64 {
    1.0
}

/// A rule row as persisted in the rule store.
///
/// `conditions` and `content` are kept as raw JSON here; they are compiled
/// into typed trees when an index generation is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RuleRecord {
    /// Immutable surrogate key.
    pub id: i64,
    /// Unique human-readable identifier.
    pub code: RuleCode,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Category tag used for filtering.
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    /// Higher values win.
    #[serde(default)]
    pub priority: i32,
    /// Condition tree (JSON).
    #[serde(default = "empty_object")]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub conditions: Value,
    /// Content payload returned to the caller (JSON).
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub content: Value,
    /// `false` soft-deletes the rule.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Optional free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Prior confidence in the rule, between 0 and 1.
    #[serde(default = "default_confidence_prior")]
    pub confidence_prior: f64,
    /// At most one rule per group is selected per match.
    #[serde(default)]
    pub mutually_exclusive_group: Option<String>,
    /// Ids of rules that must not co-occur with this one.
    #[serde(default)]
    pub contradicts: Vec<i64>,
    /// Free-form tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Per audience segment score multiplier.
    #[serde(default)]
    pub segment_weights: HashMap<String, f64>,
    /// Business impact weight used by ranked matching.
    #[serde(default = "default_biz_impact_weight")]
    pub biz_impact_weight: f64,
    /// Historical performance score used by ranked matching.
    #[serde(default)]
    pub history_score: f64,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last modification timestamp.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

impl RuleRecord {
    /// Create an enabled rule with default ranking attributes.
    pub fn new(
        id: i64,
        code: impl Into<RuleCode>,
        rule_type: impl Into<RuleType>,
        conditions: Value,
        content: Value,
    ) -> Self {
        let code = code.into();
        Self {
            id,
            name: code.to_string(),
            code,
            rule_type: rule_type.into(),
            priority: 0,
            conditions,
            content,
            enabled: true,
            description: None,
            confidence_prior: default_confidence_prior(),
            mutually_exclusive_group: None,
            contradicts: Vec::new(),
            tags: Vec::new(),
            segment_weights: HashMap::new(),
            biz_impact_weight: default_biz_impact_weight(),
            history_score: 0.0,
            created_at: None,
            updated_at: None,
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the enabled state.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the confidence prior.
    #[must_use]
    pub fn with_confidence_prior(mut self, confidence: f64) -> Self {
        self.confidence_prior = confidence;
        self
    }

    /// Place the rule in a mutual-exclusion group.
    #[must_use]
    pub fn with_exclusive_group(mut self, group: impl Into<String>) -> Self {
        self.mutually_exclusive_group = Some(group.into());
        self
    }

    /// Set the ids this rule contradicts.
    #[must_use]
    pub fn with_contradicts(mut self, ids: Vec<i64>) -> Self {
        self.contradicts = ids;
        self
    }

    /// Set the tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Add a segment weight.
    #[must_use]
    pub fn with_segment_weight(mut self, segment: impl Into<String>, weight: f64) -> Self {
        self.segment_weights.insert(segment.into(), weight);
        self
    }

    /// Set the business impact weight.
    #[must_use]
    pub fn with_biz_impact_weight(mut self, weight: f64) -> Self {
        self.biz_impact_weight = weight;
        self
    }

    /// Set the history score.
    #[must_use]
    pub fn with_history_score(mut self, score: f64) -> Self {
        self.history_score = score;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rule_construction_defaults() {
        let rule = RuleRecord::new(
            1,
            "CAREER_WOOD",
            "career",
            json!({"day_pillar": "*"}),
            json!({"type": "text", "text": "..."}),
        );
        assert_eq!(rule.name, "CAREER_WOOD");
        assert!(rule.enabled);
        assert_eq!(rule.priority, 0);
        assert!((rule.confidence_prior - 0.5).abs() < f64::EPSILON);
        assert!((rule.biz_impact_weight - 1.0).abs() < f64::EPSILON);
        assert!(rule.contradicts.is_empty());
    }

    #[test]
    fn type_field_is_renamed() {
        let rule = RuleRecord::new(1, "A", "career", json!({}), json!(null));
        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(value["type"], "career");
        assert!(value.get("rule_type").is_none());
    }

    #[test]
    fn minimal_json_uses_defaults() {
        let rule: RuleRecord = serde_json::from_value(json!({
            "id": 7,
            "code": "MIN",
            "type": "career"
        }))
        .unwrap();
        assert!(rule.enabled);
        assert_eq!(rule.conditions, json!({}));
        assert!(rule.mutually_exclusive_group.is_none());
        assert!(rule.segment_weights.is_empty());
    }

    #[test]
    fn builder_sets_ranking_attributes() {
        let rule = RuleRecord::new(2, "B", "career", json!({}), json!(null))
            .with_priority(100)
            .with_exclusive_group("G")
            .with_contradicts(vec![3, 4])
            .with_segment_weight("vip", 1.5)
            .with_history_score(0.2)
            .with_biz_impact_weight(2.0)
            .with_enabled(false);
        assert_eq!(rule.priority, 100);
        assert_eq!(rule.mutually_exclusive_group.as_deref(), Some("G"));
        assert_eq!(rule.contradicts, vec![3, 4]);
        assert_eq!(rule.segment_weights.get("vip"), Some(&1.5));
        assert!(!rule.enabled);
    }
}
