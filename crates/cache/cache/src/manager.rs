use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use moka::future::Cache;
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::key::CacheKey;
use crate::metrics::{CacheMetrics, CacheTier};
use crate::shared::SharedCache;

type FlightFuture<V> = Shared<BoxFuture<'static, Result<Arc<V>, CacheError>>>;

struct Flight<V> {
    id: u64,
    future: FlightFuture<V>,
}

/// State shared between the manager and its spawned computations.
struct Inner<V> {
    l1: Cache<CacheKey, Arc<V>>,
    l2: Option<Arc<dyn SharedCache>>,
    config: CacheConfig,
    metrics: Arc<CacheMetrics>,
    flights: Mutex<HashMap<CacheKey, Flight<V>>>,
    next_flight: AtomicU64,
    /// Bumped by every flush; a computation started under an older
    /// generation returns its value but does not populate the cache.
    generation: AtomicU64,
}

/// Two-tier cache with single-flight recomputation.
///
/// Lookups go L1, then L2, then `compute`. At most one computation runs per
/// key at a time; concurrent callers await the same spawned task. A caller
/// that times out gets [`CacheError::Timeout`] while the computation keeps
/// running and still populates the cache. L2 failures are logged and counted,
/// then treated as misses.
pub struct CacheManager<V> {
    inner: Arc<Inner<V>>,
    _value: PhantomData<fn() -> V>,
}

impl<V> Clone for CacheManager<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _value: PhantomData,
        }
    }
}

impl<V> std::fmt::Debug for CacheManager<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("config", &self.inner.config)
            .field("l2", &self.inner.l2.is_some())
            .finish_non_exhaustive()
    }
}

impl<V> CacheManager<V>
where
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Create a cache with an L1 tier only.
    pub fn new(config: CacheConfig, metrics: Arc<CacheMetrics>) -> Self {
        Self::build(config, None, metrics)
    }

    /// Create a cache backed by a shared L2 tier.
    pub fn with_shared(
        config: CacheConfig,
        l2: Arc<dyn SharedCache>,
        metrics: Arc<CacheMetrics>,
    ) -> Self {
        Self::build(config, Some(l2), metrics)
    }

    fn build(
        config: CacheConfig,
        l2: Option<Arc<dyn SharedCache>>,
        metrics: Arc<CacheMetrics>,
    ) -> Self {
        let l1 = Cache::builder()
            .max_capacity(config.l1_capacity)
            .time_to_live(config.l1_ttl)
            .build();
        Self {
            inner: Arc::new(Inner {
                l1,
                l2,
                config,
                metrics,
                flights: Mutex::new(HashMap::new()),
                next_flight: AtomicU64::new(0),
                generation: AtomicU64::new(0),
            }),
            _value: PhantomData,
        }
    }

    pub fn metrics(&self) -> &Arc<CacheMetrics> {
        &self.inner.metrics
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Whether an L2 tier is configured.
    pub fn has_shared(&self) -> bool {
        self.inner.l2.is_some()
    }

    /// Number of L1 entries (approximate; pending maintenance is not run).
    pub fn l1_entry_count(&self) -> u64 {
        self.inner.l1.entry_count()
    }

    /// Number of computations currently in flight.
    pub fn in_flight(&self) -> usize {
        self.inner.flights.lock().len()
    }

    /// Return the cached value for `key`, computing it on a miss.
    ///
    /// `compute` is only invoked if no computation for `key` is already in
    /// flight; otherwise the caller joins the existing one.
    pub async fn get_or_compute<F, Fut>(&self, key: CacheKey, compute: F) -> Result<Arc<V>, CacheError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, CacheError>> + Send + 'static,
    {
        let inner = &self.inner;
        if let Some(value) = inner.l1.get(&key).await {
            inner.metrics.record_hit(CacheTier::L1);
            return Ok(value);
        }
        inner.metrics.record_miss(CacheTier::L1);

        let flight = {
            let mut flights = inner.flights.lock();
            if let Some(existing) = flights.get(&key) {
                inner.metrics.increment_coalesced();
                existing.future.clone()
            } else {
                let id = inner.next_flight.fetch_add(1, Ordering::Relaxed);
                let future = spawn_flight(Arc::clone(inner), key.clone(), id, compute);
                flights.insert(
                    key.clone(),
                    Flight {
                        id,
                        future: future.clone(),
                    },
                );
                future
            }
        };

        let timeout = inner.config.compute_timeout;
        if let Ok(result) = tokio::time::timeout(timeout, flight).await {
            result
        } else {
            inner.metrics.increment_timeouts();
            warn!(key = %key, ?timeout, "gave up waiting for cache computation");
            Err(CacheError::Timeout(timeout))
        }
    }

    /// Flush L1 and L2 for all keys.
    ///
    /// Computations still in flight complete for their callers but do not
    /// populate the cache. An L2 failure is logged and returned after L1 has
    /// been cleared.
    pub async fn invalidate_all(&self) -> Result<(), CacheError> {
        let inner = &self.inner;
        inner.generation.fetch_add(1, Ordering::SeqCst);
        inner.flights.lock().clear();
        inner.l1.invalidate_all();
        inner.metrics.increment_invalidations();

        if let Some(l2) = &inner.l2
            && let Err(e) = l2.clear().await
        {
            inner.metrics.increment_l2_errors();
            warn!(error = %e, "failed to clear shared cache tier");
            return Err(e);
        }
        debug!("cache flushed");
        Ok(())
    }
}

fn spawn_flight<V, F, Fut>(
    inner: Arc<Inner<V>>,
    key: CacheKey,
    id: u64,
    compute: F,
) -> FlightFuture<V>
where
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<V, CacheError>> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let result = run_flight(&inner, &key, compute).await;
        let mut flights = inner.flights.lock();
        if flights.get(&key).is_some_and(|f| f.id == id) {
            flights.remove(&key);
        }
        result
    });

    async move {
        handle
            .await
            .map_err(|e| CacheError::Compute(format!("computation task failed: {e}")))?
    }
    .boxed()
    .shared()
}

async fn run_flight<V, F, Fut>(inner: &Inner<V>, key: &CacheKey, compute: F) -> Result<Arc<V>, CacheError>
where
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, CacheError>>,
{
    let generation = inner.generation.load(Ordering::SeqCst);

    // A previous flight may have completed between the caller's L1 miss and
    // this flight's registration.
    if let Some(value) = inner.l1.get(key).await {
        return Ok(value);
    }

    if let Some(l2) = &inner.l2 {
        match l2.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<V>(&raw) {
                Ok(value) => {
                    inner.metrics.record_hit(CacheTier::L2);
                    let value = Arc::new(value);
                    if inner.generation.load(Ordering::SeqCst) == generation {
                        inner.l1.insert(key.clone(), Arc::clone(&value)).await;
                    }
                    return Ok(value);
                }
                Err(e) => {
                    inner.metrics.increment_l2_errors();
                    warn!(key = %key, error = %e, "discarding undecodable shared cache entry");
                    inner.metrics.record_miss(CacheTier::L2);
                }
            },
            Ok(None) => inner.metrics.record_miss(CacheTier::L2),
            Err(e) => {
                inner.metrics.increment_l2_errors();
                warn!(key = %key, error = %e, "shared cache read failed, computing");
            }
        }
    }

    inner.metrics.increment_computations();
    let value = Arc::new(compute().await?);

    if inner.generation.load(Ordering::SeqCst) != generation {
        debug!(key = %key, "cache flushed during computation, not storing");
        return Ok(value);
    }

    if let Some(l2) = &inner.l2 {
        let stored = match serde_json::to_string(value.as_ref()) {
            Ok(raw) => l2.set(key, raw, inner.config.l2_ttl).await,
            Err(e) => Err(CacheError::from(e)),
        };
        if let Err(e) = stored {
            inner.metrics.increment_l2_errors();
            warn!(key = %key, error = %e, "shared cache write failed");
        } else if inner.generation.load(Ordering::SeqCst) != generation {
            // The flush may have run before this write landed.
            debug!(key = %key, "cache flushed during shared write, withdrawing entry");
            if let Err(e) = l2.delete(key).await {
                inner.metrics.increment_l2_errors();
                warn!(key = %key, error = %e, "failed to withdraw stale shared cache entry");
            }
            return Ok(value);
        }
    }

    inner.l1.insert(key.clone(), Arc::clone(&value)).await;
    if inner.generation.load(Ordering::SeqCst) != generation {
        inner.l1.invalidate(key).await;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use super::*;
    use crate::shared::MemorySharedCache;

    fn config() -> CacheConfig {
        CacheConfig::default().with_compute_timeout(Duration::from_secs(2))
    }

    fn counting(
        calls: &Arc<AtomicUsize>,
        value: &str,
        delay: Duration,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<String, CacheError>> + Send + 'static {
        let calls = Arc::clone(calls);
        let value = value.to_owned();
        move || {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                Ok(value)
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn second_lookup_hits_l1() {
        let metrics = Arc::new(CacheMetrics::default());
        let cache: CacheManager<String> = CacheManager::new(config(), Arc::clone(&metrics));
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::new("a");

        let first = cache
            .get_or_compute(key.clone(), counting(&calls, "v", Duration::ZERO))
            .await
            .unwrap();
        let second = cache
            .get_or_compute(key, counting(&calls, "other", Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(*first, "v");
        assert_eq!(*second, "v");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let snap = metrics.snapshot();
        assert_eq!(snap.l1_hits, 1);
        assert_eq!(snap.l1_misses, 1);
        assert_eq!(snap.computations, 1);
    }

    #[tokio::test]
    async fn concurrent_misses_compute_once() {
        let cache: CacheManager<String> =
            CacheManager::new(config(), Arc::new(CacheMetrics::default()));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..50 {
            let cache = cache.clone();
            let compute = counting(&calls, "shared", Duration::from_millis(50));
            handles.push(tokio::spawn(async move {
                cache.get_or_compute(CacheKey::new("hot"), compute).await
            }));
        }
        for handle in handles {
            assert_eq!(*handle.await.unwrap().unwrap(), "shared");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.in_flight(), 0);
    }

    #[tokio::test]
    async fn l2_is_consulted_before_computing() {
        let l2 = Arc::new(MemorySharedCache::new());
        let metrics = Arc::new(CacheMetrics::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::new("warm");

        let writer: CacheManager<String> =
            CacheManager::with_shared(config(), Arc::clone(&l2) as _, Arc::new(CacheMetrics::default()));
        writer
            .get_or_compute(key.clone(), counting(&calls, "from-a", Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(l2.len(), 1);

        // A second instance with a cold L1 finds the value in L2.
        let reader: CacheManager<String> =
            CacheManager::with_shared(config(), Arc::clone(&l2) as _, Arc::clone(&metrics));
        let value = reader
            .get_or_compute(key, counting(&calls, "from-b", Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(*value, "from-a");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.snapshot().l2_hits, 1);
    }

    #[tokio::test]
    async fn l2_outage_falls_through() {
        let l2 = Arc::new(MemorySharedCache::new());
        l2.set_available(false);
        let metrics = Arc::new(CacheMetrics::default());
        let cache: CacheManager<String> =
            CacheManager::with_shared(config(), Arc::clone(&l2) as _, Arc::clone(&metrics));
        let calls = Arc::new(AtomicUsize::new(0));

        let value = cache
            .get_or_compute(CacheKey::new("k"), counting(&calls, "v", Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(*value, "v");
        // Read and write both failed.
        assert_eq!(metrics.snapshot().l2_errors, 2);

        // L1 still serves the value.
        cache
            .get_or_compute(CacheKey::new("k"), counting(&calls, "x", Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn timeout_does_not_cancel_computation() {
        let metrics = Arc::new(CacheMetrics::default());
        let cache: CacheManager<String> = CacheManager::new(
            CacheConfig::default().with_compute_timeout(Duration::from_millis(20)),
            Arc::clone(&metrics),
        );
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::new("slow");

        let err = cache
            .get_or_compute(key.clone(), counting(&calls, "late", Duration::from_millis(150)))
            .await
            .unwrap_err();
        assert!(matches!(err, CacheError::Timeout(_)));
        assert_eq!(metrics.snapshot().timeouts, 1);

        tokio::time::sleep(Duration::from_millis(300)).await;
        let value = cache
            .get_or_compute(key, counting(&calls, "again", Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(*value, "late");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn compute_errors_are_not_cached() {
        let cache: CacheManager<String> =
            CacheManager::new(config(), Arc::new(CacheMetrics::default()));
        let err = cache
            .get_or_compute(CacheKey::new("e"), || async {
                Err::<String, _>(CacheError::Compute("boom".into()))
            })
            .await
            .unwrap_err();
        assert_eq!(err, CacheError::Compute("boom".into()));

        let value = cache
            .get_or_compute(CacheKey::new("e"), || async { Ok("ok".to_owned()) })
            .await
            .unwrap();
        assert_eq!(*value, "ok");
    }

    #[tokio::test]
    async fn invalidate_all_clears_both_tiers() {
        let l2 = Arc::new(MemorySharedCache::new());
        let cache: CacheManager<String> =
            CacheManager::with_shared(config(), Arc::clone(&l2) as _, Arc::new(CacheMetrics::default()));
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::new("flush");

        cache
            .get_or_compute(key.clone(), counting(&calls, "v1", Duration::ZERO))
            .await
            .unwrap();
        cache.invalidate_all().await.unwrap();
        assert!(l2.is_empty());

        let value = cache
            .get_or_compute(key, counting(&calls, "v2", Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(*value, "v2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.metrics().snapshot().invalidations, 1);
    }

    /// A shared tier whose writes stall, so a flush can land mid-write.
    struct SlowWriteCache {
        inner: MemorySharedCache,
        delay: Duration,
    }

    #[async_trait::async_trait]
    impl SharedCache for SlowWriteCache {
        async fn get(&self, key: &CacheKey) -> Result<Option<String>, CacheError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &CacheKey, value: String, ttl: Duration) -> Result<(), CacheError> {
            tokio::time::sleep(self.delay).await;
            self.inner.set(key, value, ttl).await
        }

        async fn delete(&self, key: &CacheKey) -> Result<(), CacheError> {
            self.inner.delete(key).await
        }

        async fn clear(&self) -> Result<(), CacheError> {
            self.inner.clear().await
        }
    }

    #[tokio::test]
    async fn flush_during_shared_write_leaves_no_stale_entry() {
        let l2 = Arc::new(SlowWriteCache {
            inner: MemorySharedCache::new(),
            delay: Duration::from_millis(100),
        });
        let cache: CacheManager<String> = CacheManager::with_shared(
            config(),
            Arc::clone(&l2) as _,
            Arc::new(CacheMetrics::default()),
        );
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::new("slow-write");

        let pending = {
            let cache = cache.clone();
            let compute = counting(&calls, "stale", Duration::ZERO);
            let key = key.clone();
            tokio::spawn(async move { cache.get_or_compute(key, compute).await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        cache.invalidate_all().await.unwrap();

        assert_eq!(*pending.await.unwrap().unwrap(), "stale");
        assert!(l2.inner.is_empty());

        let value = cache
            .get_or_compute(key, counting(&calls, "fresh", Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(*value, "fresh");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn flush_during_computation_skips_store() {
        let cache: CacheManager<String> =
            CacheManager::new(config(), Arc::new(CacheMetrics::default()));
        let calls = Arc::new(AtomicUsize::new(0));
        let key = CacheKey::new("racy");

        let pending = {
            let cache = cache.clone();
            let compute = counting(&calls, "stale", Duration::from_millis(100));
            let key = key.clone();
            tokio::spawn(async move { cache.get_or_compute(key, compute).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        cache.invalidate_all().await.unwrap();

        assert_eq!(*pending.await.unwrap().unwrap(), "stale");
        let value = cache
            .get_or_compute(key, counting(&calls, "fresh", Duration::ZERO))
            .await
            .unwrap();
        assert_eq!(*value, "fresh");
    }
}
