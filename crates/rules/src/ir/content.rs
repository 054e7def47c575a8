use serde_json::Value;

use crate::error::RuleError;

/// Content type tag marking an adapter-resolved payload.
pub const DYNAMIC_CONTENT_TYPE: &str = "dynamic";

/// Compiled rule content.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleContent {
    /// Returned verbatim.
    Static(Value),
    /// Resolved at match time through a query adapter.
    Dynamic {
        adapter: String,
        method: String,
        default_content: Option<Value>,
    },
}

impl RuleContent {
    /// Compile a stored content payload.
    ///
    /// Anything whose `type` is not `"dynamic"` is static and passed through
    /// untouched. A dynamic block must name an adapter (`query_adapter`, or
    /// `adapter` as an alias) and a `method`.
    pub fn compile(value: &Value) -> Result<Self, RuleError> {
        let Some(map) = value.as_object() else {
            return Ok(Self::Static(value.clone()));
        };
        if map.get("type").and_then(Value::as_str) != Some(DYNAMIC_CONTENT_TYPE) {
            return Ok(Self::Static(value.clone()));
        }

        let adapter = map
            .get("query_adapter")
            .or_else(|| map.get("adapter"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                RuleError::MalformedContent("dynamic content without 'query_adapter'".into())
            })?;
        let method = map
            .get("method")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| RuleError::MalformedContent("dynamic content without 'method'".into()))?;

        Ok(Self::Dynamic {
            adapter: adapter.to_owned(),
            method: method.to_owned(),
            default_content: map.get("default_content").filter(|v| !v.is_null()).cloned(),
        })
    }

    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic { .. })
    }
}
