use serde::Deserialize;

/// A query adapter registered at startup.
///
/// # Example
///
/// ```toml
/// [[adapters]]
/// name = "rizhu_gender"
/// type = "table"
/// path = "data/rizhu_gender.json"
/// key_fields = ["day_pillar", "gender"]
/// ```
#[derive(Debug, Deserialize)]
pub struct AdapterConfig {
    /// Name referenced by `query_adapter` in rule content.
    pub name: String,
    /// Adapter type. Only `"table"` is supported.
    #[serde(rename = "type", default = "default_adapter_type")]
    pub adapter_type: String,
    /// Path of the JSON table (`key -> {method -> content}`).
    pub path: String,
    /// Fact fields whose values, joined with `|`, form the table key.
    #[serde(default)]
    pub key_fields: Vec<String>,
}

fn default_adapter_type() -> String {
    "table".to_owned()
}
