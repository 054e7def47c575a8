use std::time::Duration;

/// Tuning for a [`CacheManager`](crate::CacheManager).
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of L1 entries.
    pub l1_capacity: u64,
    /// L1 time-to-live.
    pub l1_ttl: Duration,
    /// L2 time-to-live.
    pub l2_ttl: Duration,
    /// How long a caller waits for a computation before giving up.
    pub compute_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            l1_capacity: 10_000,
            l1_ttl: Duration::from_secs(300),
            l2_ttl: Duration::from_secs(3600),
            compute_timeout: Duration::from_secs(5),
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn with_l1_capacity(mut self, capacity: u64) -> Self {
        self.l1_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_l1_ttl(mut self, ttl: Duration) -> Self {
        self.l1_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_l2_ttl(mut self, ttl: Duration) -> Self {
        self.l2_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_compute_timeout(mut self, timeout: Duration) -> Self {
        self.compute_timeout = timeout;
        self
    }
}
