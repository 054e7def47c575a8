use std::sync::Arc;

use tracing::info;

use augur_cache::{MemorySharedCache, SharedCache};

use crate::config::CacheServerConfig;
use crate::error::ServerError;

/// Create the shared (L2) cache tier, if one is configured.
pub fn create_shared_cache(
    config: &CacheServerConfig,
) -> Result<Option<Arc<dyn SharedCache>>, ServerError> {
    match config.l2_backend.as_str() {
        "none" => Ok(None),
        "memory" => {
            info!("in-memory shared cache tier enabled");
            Ok(Some(Arc::new(MemorySharedCache::new())))
        }
        #[cfg(feature = "redis")]
        "redis" => {
            let redis_config = augur_cache_redis::RedisConfig {
                url: config
                    .l2_url
                    .clone()
                    .ok_or_else(|| ServerError::Config("cache.l2_url is required for redis".into()))?,
                prefix: config.l2_prefix.clone(),
                pool_size: config.l2_pool_size,
                ..augur_cache_redis::RedisConfig::default()
            };
            let cache = augur_cache_redis::RedisSharedCache::new(&redis_config)
                .map_err(|e| ServerError::Config(format!("redis cache: {e}")))?;
            info!(prefix = %config.l2_prefix, "redis shared cache tier enabled");
            Ok(Some(Arc::new(cache)))
        }
        other => Err(ServerError::Config(format!(
            "unsupported cache l2_backend: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backends() {
        assert!(create_shared_cache(&CacheServerConfig::default()).unwrap().is_none());

        let memory = CacheServerConfig {
            l2_backend: "memory".into(),
            ..CacheServerConfig::default()
        };
        assert!(create_shared_cache(&memory).unwrap().is_some());

        let bogus = CacheServerConfig {
            l2_backend: "memcached".into(),
            ..CacheServerConfig::default()
        };
        assert!(create_shared_cache(&bogus).is_err());
    }
}
