use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use augur_core::{MatchSet, MatchedRule, RuleType};
use augur_rules::MalformedRule;

use crate::tracker::TrackerState;

/// Parameters of a match beyond the facts themselves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchRequest {
    /// Restrict candidates to these types. `None` or empty means all types.
    pub rule_types: Option<Vec<RuleType>>,
    /// Order survivors by weighted score instead of priority.
    pub ranked: bool,
    /// Audience segment for the ranked score multiplier.
    pub segment: Option<String>,
}

impl MatchRequest {
    #[must_use]
    pub fn for_types(rule_types: Option<Vec<RuleType>>) -> Self {
        Self {
            rule_types,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn ranked(mut self) -> Self {
        self.ranked = true;
        self
    }

    #[must_use]
    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segment = Some(segment.into());
        self
    }

    /// Cache variant tag distinguishing result shapes for the same facts.
    pub(crate) fn variant(&self) -> String {
        match (self.ranked, self.segment.as_deref()) {
            (false, _) => "filtered".to_owned(),
            (true, None) => "ranked".to_owned(),
            (true, Some(segment)) => format!("ranked:{segment}"),
        }
    }
}

/// The rules that apply to a fact context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub matched_rules: Vec<MatchedRule>,
    pub rule_count: usize,
    /// Rule-set version the result was computed against.
    pub version: u64,
}

impl From<&MatchSet> for MatchResult {
    fn from(set: &MatchSet) -> Self {
        Self {
            matched_rules: set.rules.clone(),
            rule_count: set.len(),
            version: set.version,
        }
    }
}

impl MatchResult {
    /// Codes of the matched rules in output order.
    #[must_use]
    pub fn codes(&self) -> Vec<&str> {
        self.matched_rules.iter().map(|r| r.code.as_str()).collect()
    }
}

/// Outcome of comparing the loaded version with the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VersionCheck {
    /// Whether a newer generation was loaded by this check.
    pub changed: bool,
    /// Version serving requests after the check.
    pub current_version: u64,
}

/// Outcome of a forced full reload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReloadOutcome {
    pub success: bool,
    /// Version serving requests after the reload attempt.
    pub version: u64,
    pub rule_count: usize,
    pub malformed: Vec<MalformedRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Point-in-time view of the engine for operators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStatus {
    pub version: u64,
    pub rule_count: usize,
    pub rule_types: Vec<RuleType>,
    /// Codes of rules left out of the current generation.
    pub malformed_codes: Vec<String>,
    pub tracker_state: TrackerState,
    pub last_reload_at: Option<DateTime<Utc>>,
    pub last_checked_at: Option<DateTime<Utc>>,
    /// Error of the most recent failed check or reload, cleared on success.
    pub last_error: Option<String>,
    pub adapters: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_tags() {
        assert_eq!(MatchRequest::default().variant(), "filtered");
        assert_eq!(
            MatchRequest::default().with_segment("vip").variant(),
            "filtered"
        );
        assert_eq!(MatchRequest::default().ranked().variant(), "ranked");
        assert_eq!(
            MatchRequest::default().ranked().with_segment("vip").variant(),
            "ranked:vip"
        );
    }

    #[test]
    fn request_deserializes_with_defaults() {
        let req: MatchRequest = serde_json::from_str(r#"{"ranked": true}"#).unwrap();
        assert!(req.ranked);
        assert!(req.rule_types.is_none());
        assert!(req.segment.is_none());
    }
}
