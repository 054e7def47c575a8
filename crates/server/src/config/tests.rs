use super::*;

#[test]
fn empty_config_uses_defaults() {
    let config: AugurConfig = toml::from_str("").unwrap();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.shutdown_timeout_seconds, 30);
    assert_eq!(config.store.backend, "memory");
    assert!(config.store.url.is_none());
    assert_eq!(config.cache.l2_backend, "none");
    assert_eq!(config.cache.l1_capacity, 10_000);
    assert_eq!(config.tracker.poll_interval_seconds, 30);
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.format, LogFormat::Compact);
    assert_eq!(config.ranking, RankingWeights::default());
    assert!(config.adapters.is_empty());
}

#[test]
fn full_config_parses() {
    let toml = r#"
        [server]
        host = "0.0.0.0"
        port = 9090

        [store]
        backend = "postgres"
        url = "postgres://localhost/augur"
        pool_size = 20
        table_prefix = "augur_"

        [cache]
        l2_backend = "redis"
        l2_url = "redis://cache:6379"
        l1_ttl_seconds = 60
        compute_timeout_ms = 250

        [tracker]
        poll_interval_seconds = 5

        [ranking]
        priority = 2.0
        confidence = 1.0

        [logging]
        level = "debug"
        format = "json"

        [[adapters]]
        name = "rizhu_gender"
        type = "table"
        path = "data/rizhu.json"
        key_fields = ["day_pillar", "gender"]
    "#;

    let config: AugurConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9090);
    assert_eq!(config.store.backend, "postgres");
    assert_eq!(config.store.pool_size, 20);
    assert_eq!(config.store.table_prefix, "augur_");
    assert_eq!(config.cache.l2_url.as_deref(), Some("redis://cache:6379"));
    assert_eq!(config.tracker.poll_interval_seconds, 5);
    assert_eq!(config.tracker.stats_flush_interval_seconds, 300);
    assert!((config.ranking.priority - 2.0).abs() < f64::EPSILON);
    assert!((config.ranking.history - 5.0).abs() < f64::EPSILON);
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.adapters.len(), 1);
    assert_eq!(config.adapters[0].adapter_type, "table");
    assert_eq!(config.adapters[0].key_fields, ["day_pillar", "gender"]);
}

#[test]
fn cache_section_converts_to_cache_config() {
    let cache: CacheServerConfig = toml::from_str(
        r#"
        l1_capacity = 42
        l1_ttl_seconds = 7
        compute_timeout_ms = 150
    "#,
    )
    .unwrap();
    let config = cache.cache_config();
    assert_eq!(config.l1_capacity, 42);
    assert_eq!(config.l1_ttl, std::time::Duration::from_secs(7));
    assert_eq!(config.compute_timeout, std::time::Duration::from_millis(150));
}

#[test]
fn tracker_intervals_are_at_least_one_second() {
    let tracker: TrackerServerConfig = toml::from_str("poll_interval_seconds = 0").unwrap();
    assert_eq!(
        tracker.tracker_config().poll_interval,
        std::time::Duration::from_secs(1)
    );
}

#[test]
fn unknown_log_format_is_rejected() {
    assert!(toml::from_str::<LoggingConfig>(r#"format = "xml""#).is_err());
}

#[test]
fn missing_config_file_falls_back_to_defaults() {
    let (config, found) = AugurConfig::load("/nonexistent/augur.toml").unwrap();
    assert!(!found);
    assert_eq!(config.store.backend, "memory");
}
