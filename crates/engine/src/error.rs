use std::time::Duration;

use thiserror::Error;

use augur_cache::CacheError;
use augur_store::StoreError;

/// Errors surfaced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The initial rule load failed, so there is no index to serve.
    #[error("cold start failed: {0}")]
    ColdStart(String),

    /// The rule store failed during an operator request.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A match did not complete within the configured timeout.
    #[error("match timed out after {0:?}")]
    Timeout(Duration),

    /// The cache failed for a reason other than a timeout.
    #[error("cache error: {0}")]
    Cache(CacheError),

    /// The engine was misconfigured (e.g. missing required components).
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<CacheError> for EngineError {
    fn from(e: CacheError) -> Self {
        match e {
            CacheError::Timeout(d) => Self::Timeout(d),
            other => Self::Cache(other),
        }
    }
}
