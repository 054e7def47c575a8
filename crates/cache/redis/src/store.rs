use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use redis::AsyncCommands;
use tracing::debug;

use augur_cache::{CacheError, CacheKey, SharedCache};

use crate::config::RedisConfig;

/// Keys deleted per `DEL` during a flush.
const DELETE_BATCH: usize = 500;

/// Redis-backed implementation of [`SharedCache`].
///
/// Values are stored as plain Redis strings with a millisecond TTL (`SET PX`).
/// [`clear`](SharedCache::clear) scans the configured prefix and deletes in
/// batches, leaving unrelated keys untouched.
pub struct RedisSharedCache {
    pool: Pool,
    prefix: String,
}

impl RedisSharedCache {
    /// Create a new `RedisSharedCache` from the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Unavailable`] if the pool cannot be created.
    pub fn new(config: &RedisConfig) -> Result<Self, CacheError> {
        let cfg = Config::from_url(&config.url);
        let pool = cfg
            .builder()
            .map(|b| {
                b.max_size(config.pool_size)
                    .wait_timeout(Some(config.connection_timeout))
                    .runtime(Runtime::Tokio1)
                    .build()
            })
            .map_err(|e| CacheError::Unavailable(e.to_string()))?
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;

        Ok(Self {
            pool,
            prefix: config.prefix.clone(),
        })
    }

    fn render_key(&self, key: &CacheKey) -> String {
        format!("{}:{}", self.prefix, key.as_str())
    }

    /// Obtain a connection from the pool.
    async fn conn(&self) -> Result<deadpool_redis::Connection, CacheError> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))
    }
}

impl std::fmt::Debug for RedisSharedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSharedCache")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SharedCache for RedisSharedCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn().await?;
        conn.get(self.render_key(key))
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))
    }

    async fn set(&self, key: &CacheKey, value: String, ttl: Duration) -> Result<(), CacheError> {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let mut conn = self.conn().await?;
        let (): () = redis::cmd("SET")
            .arg(self.render_key(key))
            .arg(value)
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), CacheError> {
        let mut conn = self.conn().await?;
        conn.del::<_, ()>(self.render_key(key))
            .await
            .map_err(|e| CacheError::Unavailable(e.to_string()))
    }

    async fn clear(&self) -> Result<(), CacheError> {
        let pattern = format!("{}:*", self.prefix);
        let mut conn = self.conn().await?;
        let mut cursor = 0u64;
        let mut pending: Vec<String> = Vec::new();
        let mut removed = 0usize;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(DELETE_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(|e| CacheError::Unavailable(e.to_string()))?;
            pending.extend(keys);

            if pending.len() >= DELETE_BATCH || (next == 0 && !pending.is_empty()) {
                removed += pending.len();
                conn.del::<_, ()>(std::mem::take(&mut pending))
                    .await
                    .map_err(|e| CacheError::Unavailable(e.to_string()))?;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!(prefix = %self.prefix, removed, "flushed shared cache");
        Ok(())
    }
}
