use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use serde::Serialize;

/// Cache tier a hit or miss was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheTier {
    L1,
    L2,
}

impl CacheTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::L1 => "l1",
            Self::L2 => "l2",
        }
    }
}

impl fmt::Display for CacheTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hit/miss counts of one tier on one UTC day, drained for persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyTierStats {
    pub date: NaiveDate,
    pub tier: CacheTier,
    pub hits: u64,
    pub misses: u64,
}

/// Atomic counters tracking cache behaviour.
///
/// Totals only ever grow. Per-day buckets accumulate separately and are
/// emptied by [`drain_daily`](Self::drain_daily).
#[derive(Debug, Default)]
pub struct CacheMetrics {
    pub l1_hits: AtomicU64,
    pub l1_misses: AtomicU64,
    pub l2_hits: AtomicU64,
    pub l2_misses: AtomicU64,
    /// L2 operations that failed and were absorbed.
    pub l2_errors: AtomicU64,
    /// Computations actually started.
    pub computations: AtomicU64,
    /// Callers that joined a computation already in flight.
    pub coalesced: AtomicU64,
    /// Callers that gave up waiting.
    pub timeouts: AtomicU64,
    /// Full flushes.
    pub invalidations: AtomicU64,
    daily: Mutex<BTreeMap<(NaiveDate, CacheTier), (u64, u64)>>,
}

impl CacheMetrics {
    pub fn record_hit(&self, tier: CacheTier) {
        match tier {
            CacheTier::L1 => self.l1_hits.fetch_add(1, Ordering::Relaxed),
            CacheTier::L2 => self.l2_hits.fetch_add(1, Ordering::Relaxed),
        };
        self.daily
            .lock()
            .entry((Utc::now().date_naive(), tier))
            .or_default()
            .0 += 1;
    }

    pub fn record_miss(&self, tier: CacheTier) {
        match tier {
            CacheTier::L1 => self.l1_misses.fetch_add(1, Ordering::Relaxed),
            CacheTier::L2 => self.l2_misses.fetch_add(1, Ordering::Relaxed),
        };
        self.daily
            .lock()
            .entry((Utc::now().date_naive(), tier))
            .or_default()
            .1 += 1;
    }

    pub fn increment_l2_errors(&self) {
        self.l2_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_computations(&self) {
        self.computations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_coalesced(&self) {
        self.coalesced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_timeouts(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_invalidations(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    /// Take and reset the per-day buckets, oldest first.
    pub fn drain_daily(&self) -> Vec<DailyTierStats> {
        std::mem::take(&mut *self.daily.lock())
            .into_iter()
            .map(|((date, tier), (hits, misses))| DailyTierStats {
                date,
                tier,
                hits,
                misses,
            })
            .collect()
    }

    /// Put drained buckets back, e.g. after a failed persistence attempt.
    pub fn restore_daily(&self, rows: Vec<DailyTierStats>) {
        let mut daily = self.daily.lock();
        for row in rows {
            let entry = daily.entry((row.date, row.tier)).or_default();
            entry.0 += row.hits;
            entry.1 += row.misses;
        }
    }

    /// Take a consistent point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            l1_hits: self.l1_hits.load(Ordering::Relaxed),
            l1_misses: self.l1_misses.load(Ordering::Relaxed),
            l2_hits: self.l2_hits.load(Ordering::Relaxed),
            l2_misses: self.l2_misses.load(Ordering::Relaxed),
            l2_errors: self.l2_errors.load(Ordering::Relaxed),
            computations: self.computations.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }
}

/// A plain data snapshot of [`CacheMetrics`] at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheMetricsSnapshot {
    pub l1_hits: u64,
    pub l1_misses: u64,
    pub l2_hits: u64,
    pub l2_misses: u64,
    pub l2_errors: u64,
    pub computations: u64,
    pub coalesced: u64,
    pub timeouts: u64,
    pub invalidations: u64,
}
