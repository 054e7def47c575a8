use std::fmt;

use augur_core::cache_key;

/// An opaque cache key: hex SHA-256 of a request fingerprint bound to a
/// rule-set version and result variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Wrap an already computed key.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Derive the key for `fingerprint` at `version` for the given variant.
    pub fn for_request(fingerprint: &str, version: u64, variant: &str) -> Self {
        Self(cache_key(fingerprint, version, variant))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
