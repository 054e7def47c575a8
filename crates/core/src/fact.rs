//! The fact context: a flat map of a subject's computed attributes.
//!
//! The engine never knows how facts were derived. It only requires that the
//! map is flat: every value is a scalar (string, number, bool) or a list of
//! scalars. `null` values are treated as absent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// A flat key/value map of computed subject attributes (pillars, gender,
/// scores, ...), fed into rule matching.
///
/// Keys are kept sorted so that [`canonical`](Self::canonical) renders a
/// deterministic string for fingerprinting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", schema(value_type = Object))]
#[serde(try_from = "BTreeMap<String, Value>")]
pub struct FactContext(BTreeMap<String, Value>);

impl FactContext {
    /// Create an empty fact context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. Invalid values are silently dropped; use
    /// [`try_insert`](Self::try_insert) to observe validation errors.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let _ = self.try_insert(key, value);
        self
    }

    /// Insert a fact, validating that it is a scalar or a list of scalars.
    pub fn try_insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), CoreError> {
        let key = key.into();
        let value = value.into();
        if key.is_empty() {
            return Err(CoreError::InvalidFact("empty fact name".into()));
        }
        validate_value(&key, &value)?;
        if value.is_null() {
            self.0.remove(&key);
        } else {
            self.0.insert(key, value);
        }
        Ok(())
    }

    /// Parse a fact context from an arbitrary JSON value.
    pub fn from_json(value: Value) -> Result<Self, CoreError> {
        match value {
            Value::Object(map) => Self::try_from(map.into_iter().collect::<BTreeMap<_, _>>()),
            other => Err(CoreError::InvalidFact(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Look up a fact by name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether a fact with the given name is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of facts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the context carries no facts at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over facts in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Deterministic rendering used as fingerprint input.
    ///
    /// Two contexts with the same facts render identically regardless of
    /// insertion order. Keys and values are both JSON-encoded, so no key can
    /// smuggle in a separator and collide with a different context.
    #[must_use]
    pub fn canonical(&self) -> String {
        let mut out = String::from("{");
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&Value::String(key.clone()).to_string());
            out.push(':');
            out.push_str(&value.to_string());
        }
        out.push('}');
        out
    }
}

impl TryFrom<BTreeMap<String, Value>> for FactContext {
    type Error = CoreError;

    fn try_from(map: BTreeMap<String, Value>) -> Result<Self, Self::Error> {
        let mut ctx = Self::new();
        for (key, value) in map {
            ctx.try_insert(key, value)?;
        }
        Ok(ctx)
    }
}

fn validate_value(key: &str, value: &Value) -> Result<(), CoreError> {
    match value {
        Value::Object(_) => Err(CoreError::InvalidFact(format!(
            "fact '{key}' is a nested object"
        ))),
        Value::Array(items) => {
            if let Some(bad) = items
                .iter()
                .find(|v| matches!(v, Value::Object(_) | Value::Array(_)))
            {
                return Err(CoreError::InvalidFact(format!(
                    "fact '{key}' contains a non-scalar element ({})",
                    json_kind(bad)
                )));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_ignores_insertion_order() {
        let a = FactContext::new()
            .with("gender", "male")
            .with("day_pillar", "甲子");
        let b = FactContext::new()
            .with("day_pillar", "甲子")
            .with("gender", "male");
        assert_eq!(a.canonical(), b.canonical());
        assert_eq!(a, b);
    }

    #[test]
    fn null_values_are_dropped() {
        let ctx = FactContext::new()
            .with("gender", "female")
            .with("month_pillar", Value::Null);
        assert_eq!(ctx.len(), 1);
        assert!(!ctx.contains("month_pillar"));
    }

    #[test]
    fn nested_objects_are_rejected() {
        let err = FactContext::from_json(serde_json::json!({
            "pillars": {"day": "甲子"}
        }))
        .unwrap_err();
        assert!(err.to_string().contains("nested object"));
    }

    #[test]
    fn scalar_lists_are_accepted() {
        let ctx = FactContext::from_json(serde_json::json!({
            "branches": ["子", "午"],
            "score": 87.5,
            "married": false
        }))
        .unwrap();
        assert_eq!(ctx.len(), 3);
        assert_eq!(ctx.get("score"), Some(&serde_json::json!(87.5)));
    }

    #[test]
    fn deserialize_validates() {
        let ok: Result<FactContext, _> = serde_json::from_str(r#"{"day_pillar":"甲子"}"#);
        assert!(ok.is_ok());

        let bad: Result<FactContext, _> = serde_json::from_str(r#"{"x":[[1]]}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn non_object_root_is_rejected() {
        let err = FactContext::from_json(serde_json::json!(["a"])).unwrap_err();
        assert!(err.to_string().contains("expected a JSON object"));
    }
}
