use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Aggregated cache hit/miss counts for one tier on one UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStatsRow {
    pub stat_date: NaiveDate,
    /// `l1` or `l2`.
    pub tier: String,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStatsRow {
    pub fn new(stat_date: NaiveDate, tier: impl Into<String>, hits: u64, misses: u64) -> Self {
        Self {
            stat_date,
            tier: tier.into(),
            hits,
            misses,
        }
    }

    /// Whether the row carries no counts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits == 0 && self.misses == 0
    }
}
