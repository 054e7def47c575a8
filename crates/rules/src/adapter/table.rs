use std::collections::HashMap;

use async_trait::async_trait;
use augur_core::FactContext;
use serde_json::{Map, Value};

use super::QueryAdapter;
use crate::error::AdapterError;
use crate::ir::condition::{GENDER_FIELD, Gender, scalar_key};

/// Separator between key field values in a table key.
pub const KEY_SEPARATOR: &str = "|";

/// An adapter over a precomputed lookup table.
///
/// Each entry is keyed by the values of `key_fields` joined with `|` (the
/// gender field in its canonical `male`/`female` spelling) and maps method
/// names to content, e.g. `"甲子|male" -> {"analysis": {...}}`.
#[derive(Debug, Clone)]
pub struct TableAdapter {
    name: String,
    key_fields: Vec<String>,
    entries: HashMap<String, Map<String, Value>>,
}

impl TableAdapter {
    pub fn new(name: impl Into<String>, key_fields: Vec<String>) -> Self {
        Self {
            name: name.into(),
            key_fields,
            entries: HashMap::new(),
        }
    }

    /// Add the content for one key and method.
    #[must_use]
    pub fn with_entry(mut self, key: impl Into<String>, method: impl Into<String>, value: Value) -> Self {
        self.entries
            .entry(key.into())
            .or_default()
            .insert(method.into(), value);
        self
    }

    /// Build a table from a JSON object of `key -> {method -> content}`.
    pub fn from_json(
        name: impl Into<String>,
        key_fields: Vec<String>,
        table: Value,
    ) -> Result<Self, AdapterError> {
        let name = name.into();
        let Value::Object(rows) = table else {
            return Err(AdapterError::Resolution(format!(
                "table for adapter '{name}' must be a JSON object"
            )));
        };
        let mut adapter = Self::new(name, key_fields);
        for (key, methods) in rows {
            let Value::Object(methods) = methods else {
                return Err(AdapterError::Resolution(format!(
                    "table row '{key}' of adapter '{}' must be an object",
                    adapter.name
                )));
            };
            adapter.entries.insert(key, methods);
        }
        Ok(adapter)
    }

    /// Number of keys in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn key_for(&self, facts: &FactContext) -> Result<String, AdapterError> {
        let mut parts = Vec::with_capacity(self.key_fields.len());
        for field in &self.key_fields {
            let raw = facts
                .get(field)
                .map(scalar_key)
                .ok_or_else(|| AdapterError::MissingFact {
                    adapter: self.name.clone(),
                    field: field.clone(),
                })?;
            let part = if field == GENDER_FIELD {
                Gender::parse(&raw).map_or(raw, |g| g.as_str().to_owned())
            } else {
                raw
            };
            parts.push(part);
        }
        Ok(parts.join(KEY_SEPARATOR))
    }
}

#[async_trait]
impl QueryAdapter for TableAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn resolve(&self, method: &str, facts: &FactContext) -> Result<Value, AdapterError> {
        let key = self.key_for(facts)?;
        let row = self
            .entries
            .get(&key)
            .ok_or_else(|| AdapterError::Resolution(format!("no entry for '{key}'")))?;
        row.get(method)
            .cloned()
            .ok_or_else(|| AdapterError::UnknownMethod {
                adapter: self.name.clone(),
                method: method.to_owned(),
            })
    }
}
