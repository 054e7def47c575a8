//! Fingerprint computation for match caching.
//!
//! A fingerprint identifies a match request independently of the rule set
//! generation; the cache key then binds it to a specific version so that a
//! version bump naturally produces fresh keys.

use sha2::{Digest, Sha256};

use crate::fact::FactContext;
use crate::types::RuleType;

/// Sort and deduplicate a rule-type filter.
///
/// `None` and an empty filter both mean "all types" and normalize to `None`.
#[must_use]
pub fn normalize_rule_types(rule_types: Option<&[RuleType]>) -> Option<Vec<RuleType>> {
    let mut types: Vec<RuleType> = rule_types?.to_vec();
    if types.is_empty() {
        return None;
    }
    types.sort();
    types.dedup();
    Some(types)
}

/// Compute the fingerprint of a match request.
///
/// The fingerprint is a hex-encoded SHA-256 hash of the normalized rule-type
/// filter and the canonical fact context.
///
/// # Example
///
/// ```
/// use augur_core::{FactContext, RuleType, fact_fingerprint};
///
/// let facts = FactContext::new().with("gender", "male");
/// let fp = fact_fingerprint(Some(&[RuleType::new("career")]), &facts);
/// assert_eq!(fp.len(), 64);
/// ```
#[must_use]
pub fn fact_fingerprint(rule_types: Option<&[RuleType]>, facts: &FactContext) -> String {
    let mut hasher = Sha256::new();

    hasher.update(b"types=");
    match normalize_rule_types(rule_types) {
        Some(types) => {
            for ty in &types {
                let encoded = serde_json::Value::String(ty.as_str().to_owned()).to_string();
                hasher.update(encoded.as_bytes());
                hasher.update(b",");
            }
        }
        None => hasher.update(b"*"),
    }
    hasher.update(b";facts=");
    hasher.update(facts.canonical().as_bytes());

    hex::encode(hasher.finalize())
}

/// Compute the cache key for a fingerprint at a given rule-set version.
///
/// `variant` distinguishes result shapes computed from the same inputs
/// (e.g. ranked vs. filtered output).
#[must_use]
pub fn cache_key(fingerprint: &str, version: u64, variant: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(fingerprint.as_bytes());
    hasher.update(b";v=");
    hasher.update(version.to_string().as_bytes());
    hasher.update(b";variant=");
    hasher.update(variant.as_bytes());
    hex::encode(hasher.finalize())
}
