use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The single-row version counter of the rule store.
///
/// `rule_version` is incremented whenever any rule row is inserted, updated
/// or disabled; it never decreases. `content_version` tracks edits to content
/// that does not affect matching and is carried for operators only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RuleVersion {
    /// Counter bumped on every rule row change.
    pub rule_version: u64,
    /// Counter bumped on content-only edits.
    #[serde(default)]
    pub content_version: u64,
    /// When the counter last moved.
    pub updated_at: DateTime<Utc>,
}

impl RuleVersion {
    /// Create a version row with the given counter.
    #[must_use]
    pub fn new(rule_version: u64) -> Self {
        Self {
            rule_version,
            content_version: 0,
            updated_at: Utc::now(),
        }
    }

    /// Return the successor of this version.
    #[must_use]
    pub fn bumped(&self) -> Self {
        Self {
            rule_version: self.rule_version + 1,
            content_version: self.content_version,
            updated_at: Utc::now(),
        }
    }
}

impl Default for RuleVersion {
    fn default() -> Self {
        Self::new(1)
    }
}
