use std::sync::Arc;

use tracing::info;

use augur_store::RuleStore;
use augur_store_memory::MemoryRuleStore;

use crate::config::StoreConfig;
use crate::error::ServerError;

/// Create the rule store selected by `config.backend`.
///
/// The postgres backend runs its migrations on creation.
pub async fn create_store(config: &StoreConfig) -> Result<Arc<dyn RuleStore>, ServerError> {
    match config.backend.as_str() {
        "memory" => {
            let store = match &config.seed_file {
                Some(path) => MemoryRuleStore::from_seed_file(path)
                    .map_err(|e| ServerError::Config(format!("seed file: {e}")))?,
                None => MemoryRuleStore::new(),
            };
            info!(rules = store.rule_count(), "memory rule store ready");
            Ok(Arc::new(store))
        }
        #[cfg(feature = "postgres")]
        "postgres" => {
            let store = augur_store_postgres::PostgresRuleStore::new(postgres_config(config)?)
                .await
                .map_err(|e| ServerError::Config(format!("postgres store: {e}")))?;
            info!(schema = %config.schema, "postgres rule store ready");
            Ok(Arc::new(store))
        }
        other => Err(ServerError::Config(format!(
            "unsupported store backend: {other}"
        ))),
    }
}

#[cfg(feature = "postgres")]
fn postgres_config(
    config: &StoreConfig,
) -> Result<augur_store_postgres::PostgresConfig, ServerError> {
    let url = config
        .url
        .clone()
        .ok_or_else(|| ServerError::Config("store.url is required for postgres".into()))?;
    Ok(augur_store_postgres::PostgresConfig {
        url,
        pool_size: config.pool_size,
        schema: config.schema.clone(),
        table_prefix: config.table_prefix.clone(),
        ..augur_store_postgres::PostgresConfig::default()
    })
}
