use async_trait::async_trait;

use augur_core::{RuleRecord, RuleVersion};

use crate::error::StoreError;
use crate::stats::CacheStatsRow;

/// A consistent read of the enabled rules and the version they belong to.
#[derive(Debug, Clone, Default)]
pub struct RuleSnapshot {
    pub version: RuleVersion,
    pub rules: Vec<RuleRecord>,
}

/// Read side of the persistent rule set.
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
/// Rules are edited out of band; the engine only reads them.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// The current version counter. Only ever increases.
    async fn current_version(&self) -> Result<RuleVersion, StoreError>;

    /// All enabled rules together with the version they were read at.
    async fn load_enabled_rules(&self) -> Result<RuleSnapshot, StoreError>;

    /// Persist aggregated cache statistics. Rows for an existing
    /// `(stat_date, tier)` are added to, not replaced.
    async fn record_cache_stats(&self, rows: &[CacheStatsRow]) -> Result<(), StoreError> {
        let _ = rows;
        Ok(())
    }
}

/// Write side used for seeding, tooling and tests.
///
/// Every successful write bumps the version counter.
#[async_trait]
pub trait RuleWriter: Send + Sync {
    /// Insert a rule, or replace the rule with the same id.
    async fn upsert_rule(&self, rule: RuleRecord) -> Result<RuleVersion, StoreError>;

    /// Enable or soft-delete the rule with the given code.
    async fn set_enabled(&self, code: &str, enabled: bool) -> Result<RuleVersion, StoreError>;
}
