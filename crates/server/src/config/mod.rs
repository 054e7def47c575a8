mod adapters;
mod cache;
mod logging;
mod server;
mod store;
mod tracker;

#[cfg(test)]
mod tests;

pub use adapters::*;
pub use cache::*;
pub use logging::*;
pub use server::*;
pub use store::*;
pub use tracker::*;

use std::path::Path;

use augur_rules::RankingWeights;
use serde::Deserialize;

use crate::error::ServerError;

/// Top-level configuration for the Augur server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct AugurConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Rule store backend configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Match cache configuration.
    #[serde(default)]
    pub cache: CacheServerConfig,
    /// Version tracker intervals.
    #[serde(default)]
    pub tracker: TrackerServerConfig,
    /// Weights of the ranked score.
    #[serde(default)]
    pub ranking: RankingWeights,
    /// Log filtering and output format.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Query adapters registered at startup.
    ///
    /// Each entry loads a precomputed lookup table that `dynamic` rule
    /// content can reference by name.
    #[serde(default)]
    pub adapters: Vec<AdapterConfig>,
}

impl AugurConfig {
    /// Load configuration from `path`, or use defaults if the file does not
    /// exist. Returns the config and whether the file was found.
    pub fn load(path: impl AsRef<Path>) -> Result<(Self, bool), ServerError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok((Self::default(), false));
        }
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Ok((config, true))
    }
}
