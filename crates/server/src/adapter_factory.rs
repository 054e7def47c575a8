use std::sync::Arc;

use tracing::info;

use augur_rules::{QueryAdapter, TableAdapter};

use crate::config::AdapterConfig;
use crate::error::ServerError;

/// Build the query adapters described in the config.
pub fn create_adapters(
    configs: &[AdapterConfig],
) -> Result<Vec<(String, Arc<dyn QueryAdapter>)>, ServerError> {
    configs.iter().map(create_adapter).collect()
}

fn create_adapter(config: &AdapterConfig) -> Result<(String, Arc<dyn QueryAdapter>), ServerError> {
    if config.adapter_type != "table" {
        return Err(ServerError::Config(format!(
            "adapter '{}': unsupported type '{}'",
            config.name, config.adapter_type
        )));
    }
    let raw = std::fs::read_to_string(&config.path)?;
    let table: serde_json::Value = serde_json::from_str(&raw)
        .map_err(|e| ServerError::Config(format!("adapter '{}': {e}", config.name)))?;
    let adapter = TableAdapter::from_json(config.name.clone(), config.key_fields.clone(), table)
        .map_err(|e| ServerError::Config(e.to_string()))?;
    info!(adapter = %config.name, entries = adapter.len(), "table adapter loaded");
    Ok((config.name.clone(), Arc::new(adapter)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_table_from_file() {
        let path = std::env::temp_dir().join(format!("augur-adapter-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"甲子|male": {"analysis": {"text": "x"}}}"#).unwrap();

        let configs = vec![AdapterConfig {
            name: "rizhu_gender".into(),
            adapter_type: "table".into(),
            path: path.display().to_string(),
            key_fields: vec!["day_pillar".into(), "gender".into()],
        }];
        let adapters = create_adapters(&configs).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(adapters.len(), 1);
        assert_eq!(adapters[0].0, "rizhu_gender");
        assert_eq!(adapters[0].1.name(), "rizhu_gender");
    }

    #[test]
    fn rejects_unknown_type() {
        let configs = vec![AdapterConfig {
            name: "x".into(),
            adapter_type: "http".into(),
            path: "unused".into(),
            key_fields: vec![],
        }];
        assert!(matches!(
            create_adapters(&configs),
            Err(ServerError::Config(_))
        ));
    }
}
