use std::time::Duration;

use augur_engine::TrackerConfig;
use serde::Deserialize;

/// Version tracker intervals.
#[derive(Debug, Deserialize)]
pub struct TrackerServerConfig {
    /// Seconds between rule version checks.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Seconds between cache statistics flushes.
    #[serde(default = "default_stats_flush_interval")]
    pub stats_flush_interval_seconds: u64,
}

impl Default for TrackerServerConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
            stats_flush_interval_seconds: default_stats_flush_interval(),
        }
    }
}

impl TrackerServerConfig {
    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            poll_interval: Duration::from_secs(self.poll_interval_seconds.max(1)),
            stats_flush_interval: Duration::from_secs(self.stats_flush_interval_seconds.max(1)),
        }
    }
}

fn default_poll_interval() -> u64 {
    30
}

fn default_stats_flush_interval() -> u64 {
    300
}
