use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use crate::error::CacheError;
use crate::key::CacheKey;

/// The shared (L2) cache tier.
///
/// Values are opaque JSON strings. Implementations must be `Send + Sync`;
/// failures are reported, never retried here.
#[async_trait]
pub trait SharedCache: Send + Sync {
    /// Get a value. Returns `None` if absent or expired.
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError>;

    /// Store a value with a time-to-live.
    async fn set(&self, key: &CacheKey, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Remove one entry. Removing an absent key is not an error.
    async fn delete(&self, key: &CacheKey) -> Result<(), CacheError>;

    /// Remove every entry owned by this cache.
    async fn clear(&self) -> Result<(), CacheError>;
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-memory [`SharedCache`] backed by a [`DashMap`].
///
/// Entries are lazily evicted on read once their TTL has elapsed. Can be
/// switched off to simulate an L2 outage.
#[derive(Debug)]
pub struct MemorySharedCache {
    data: DashMap<String, Entry>,
    available: AtomicBool,
}

impl Default for MemorySharedCache {
    fn default() -> Self {
        Self {
            data: DashMap::new(),
            available: AtomicBool::new(true),
        }
    }
}

impl MemorySharedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle availability; while unavailable every call fails.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn check_available(&self) -> Result<(), CacheError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CacheError::Unavailable("memory L2 switched off".into()))
        }
    }
}

#[async_trait]
impl SharedCache for MemorySharedCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError> {
        self.check_available()?;
        let now = Instant::now();
        self.data.remove_if(key.as_str(), |_, e| e.expires_at <= now);
        Ok(self.data.get(key.as_str()).map(|e| e.value.clone()))
    }

    async fn set(&self, key: &CacheKey, value: String, ttl: Duration) -> Result<(), CacheError> {
        self.check_available()?;
        self.data.insert(
            key.as_str().to_owned(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), CacheError> {
        self.check_available()?;
        self.data.remove(key.as_str());
        Ok(())
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.check_available()?;
        self.data.clear();
        Ok(())
    }
}
