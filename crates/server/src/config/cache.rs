use std::time::Duration;

use augur_cache::CacheConfig;
use serde::Deserialize;

/// Match cache configuration.
///
/// L1 is always on; the shared L2 tier is selected with `l2_backend`
/// (`"none"`, `"memory"` or `"redis"`).
#[derive(Debug, Deserialize)]
pub struct CacheServerConfig {
    /// Maximum number of L1 entries.
    #[serde(default = "default_l1_capacity")]
    pub l1_capacity: u64,
    /// L1 entry lifetime in seconds.
    #[serde(default = "default_l1_ttl")]
    pub l1_ttl_seconds: u64,
    /// Shared tier backend.
    #[serde(default = "default_l2_backend")]
    pub l2_backend: String,
    /// Redis URL when `l2_backend = "redis"`.
    pub l2_url: Option<String>,
    /// Key prefix in the shared tier.
    #[serde(default = "default_l2_prefix")]
    pub l2_prefix: String,
    /// L2 entry lifetime in seconds.
    #[serde(default = "default_l2_ttl")]
    pub l2_ttl_seconds: u64,
    /// Redis connection pool size.
    #[serde(default = "default_l2_pool_size")]
    pub l2_pool_size: usize,
    /// How long a match request waits for a computation, in milliseconds.
    #[serde(default = "default_compute_timeout_ms")]
    pub compute_timeout_ms: u64,
}

impl Default for CacheServerConfig {
    fn default() -> Self {
        Self {
            l1_capacity: default_l1_capacity(),
            l1_ttl_seconds: default_l1_ttl(),
            l2_backend: default_l2_backend(),
            l2_url: None,
            l2_prefix: default_l2_prefix(),
            l2_ttl_seconds: default_l2_ttl(),
            l2_pool_size: default_l2_pool_size(),
            compute_timeout_ms: default_compute_timeout_ms(),
        }
    }
}

impl CacheServerConfig {
    /// The cache manager settings described by this section.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::default()
            .with_l1_capacity(self.l1_capacity)
            .with_l1_ttl(Duration::from_secs(self.l1_ttl_seconds))
            .with_l2_ttl(Duration::from_secs(self.l2_ttl_seconds))
            .with_compute_timeout(Duration::from_millis(self.compute_timeout_ms))
    }
}

fn default_l1_capacity() -> u64 {
    10_000
}

fn default_l1_ttl() -> u64 {
    300
}

fn default_l2_backend() -> String {
    "none".to_owned()
}

fn default_l2_prefix() -> String {
    "augur:match".to_owned()
}

fn default_l2_ttl() -> u64 {
    3600
}

fn default_l2_pool_size() -> usize {
    10
}

fn default_compute_timeout_ms() -> u64 {
    5000
}
