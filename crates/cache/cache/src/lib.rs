//! Two-tier match cache.
//!
//! L1 is a bounded, TTL-based process-local [`moka`] cache; L2 is any
//! [`SharedCache`] (in-memory or Redis). Misses are computed at most once per
//! key at a time: concurrent callers subscribe to a single spawned computation.

pub mod config;
pub mod error;
pub mod key;
pub mod manager;
pub mod metrics;
pub mod shared;

pub use config::CacheConfig;
pub use error::CacheError;
pub use key::CacheKey;
pub use manager::CacheManager;
pub use metrics::{CacheMetrics, CacheMetricsSnapshot, CacheTier, DailyTierStats};
pub use shared::{MemorySharedCache, SharedCache};
