use serde_json::json;

use augur_core::RuleRecord;

use crate::error::StoreError;
use crate::stats::CacheStatsRow;
use crate::store::{RuleStore, RuleWriter};

fn test_rule(id: i64, code: &str, priority: i32) -> RuleRecord {
    RuleRecord::new(
        id,
        code,
        "conformance",
        json!({"all": [{"day_pillar": "*"}, {"gender": "male"}]}),
        json!({"text": code}),
    )
    .with_priority(priority)
    .with_tags(vec!["conformance".into()])
}

/// Run the full rule store conformance test suite.
///
/// Call this from your backend's test module with a fresh, empty store; pass
/// the same instance for both arguments.
///
/// # Errors
///
/// Returns an error if any conformance test fails.
pub async fn run_store_conformance_tests(
    store: &dyn RuleStore,
    writer: &dyn RuleWriter,
) -> Result<(), StoreError> {
    test_empty_store(store).await?;
    test_upsert_bumps_version(store, writer).await?;
    test_update_in_place(store, writer).await?;
    test_disable_hides_rule(store, writer).await?;
    test_set_enabled_missing(writer).await?;
    test_snapshot_matches_version(store, writer).await?;
    test_record_cache_stats(store).await?;
    Ok(())
}

async fn test_empty_store(store: &dyn RuleStore) -> Result<(), StoreError> {
    let snapshot = store.load_enabled_rules().await?;
    assert!(snapshot.rules.is_empty(), "fresh store should have no rules");
    let version = store.current_version().await?;
    assert!(version.rule_version >= 1, "versions start at 1");
    Ok(())
}

async fn test_upsert_bumps_version(
    store: &dyn RuleStore,
    writer: &dyn RuleWriter,
) -> Result<(), StoreError> {
    let before = store.current_version().await?;
    let after = writer.upsert_rule(test_rule(101, "CONF_A", 10)).await?;
    assert!(
        after.rule_version > before.rule_version,
        "insert must bump the version"
    );
    assert_eq!(store.current_version().await?.rule_version, after.rule_version);

    let snapshot = store.load_enabled_rules().await?;
    let rule = snapshot
        .rules
        .iter()
        .find(|r| r.code.as_str() == "CONF_A")
        .ok_or_else(|| StoreError::NotFound("CONF_A".into()))?;
    assert_eq!(rule.id, 101);
    assert_eq!(rule.priority, 10);
    assert_eq!(rule.conditions["all"][1]["gender"], "male");
    assert_eq!(rule.tags, vec!["conformance".to_owned()]);
    Ok(())
}

async fn test_update_in_place(
    store: &dyn RuleStore,
    writer: &dyn RuleWriter,
) -> Result<(), StoreError> {
    writer.upsert_rule(test_rule(102, "CONF_B", 1)).await?;
    let before = store.current_version().await?;
    let after = writer.upsert_rule(test_rule(102, "CONF_B", 99)).await?;
    assert!(after.rule_version > before.rule_version, "update must bump the version");

    let snapshot = store.load_enabled_rules().await?;
    let matches: Vec<_> = snapshot
        .rules
        .iter()
        .filter(|r| r.code.as_str() == "CONF_B")
        .collect();
    assert_eq!(matches.len(), 1, "update must not duplicate the rule");
    assert_eq!(matches[0].priority, 99);
    Ok(())
}

async fn test_disable_hides_rule(
    store: &dyn RuleStore,
    writer: &dyn RuleWriter,
) -> Result<(), StoreError> {
    writer.upsert_rule(test_rule(103, "CONF_C", 5)).await?;
    let before = store.current_version().await?;
    let after = writer.set_enabled("CONF_C", false).await?;
    assert!(after.rule_version > before.rule_version, "disable must bump the version");

    let snapshot = store.load_enabled_rules().await?;
    assert!(
        snapshot.rules.iter().all(|r| r.code.as_str() != "CONF_C"),
        "disabled rules must not be loaded"
    );

    writer.set_enabled("CONF_C", true).await?;
    let snapshot = store.load_enabled_rules().await?;
    assert!(snapshot.rules.iter().any(|r| r.code.as_str() == "CONF_C"));
    Ok(())
}

async fn test_set_enabled_missing(writer: &dyn RuleWriter) -> Result<(), StoreError> {
    let result = writer.set_enabled("CONF_DOES_NOT_EXIST", false).await;
    assert!(
        matches!(result, Err(StoreError::NotFound(_))),
        "unknown code should be NotFound"
    );
    Ok(())
}

async fn test_snapshot_matches_version(
    store: &dyn RuleStore,
    writer: &dyn RuleWriter,
) -> Result<(), StoreError> {
    let written = writer.upsert_rule(test_rule(104, "CONF_D", 3)).await?;
    let snapshot = store.load_enabled_rules().await?;
    assert_eq!(
        snapshot.version.rule_version, written.rule_version,
        "snapshot must carry the version it was read at"
    );
    Ok(())
}

async fn test_record_cache_stats(store: &dyn RuleStore) -> Result<(), StoreError> {
    let today = chrono::Utc::now().date_naive();
    store
        .record_cache_stats(&[
            CacheStatsRow::new(today, "l1", 3, 1),
            CacheStatsRow::new(today, "l2", 0, 1),
        ])
        .await?;
    store
        .record_cache_stats(&[CacheStatsRow::new(today, "l1", 2, 0)])
        .await?;
    Ok(())
}
