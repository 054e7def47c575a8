use sqlx::PgPool;

use crate::config::PostgresConfig;

/// Run database migrations, creating required tables if they do not exist.
///
/// Creates the rules table, the single-row version table (seeded at 1), the
/// daily cache statistics table, and a statement-level trigger that bumps the
/// version on every insert, update or delete of rules.
///
/// # Errors
///
/// Returns a [`sqlx::Error`] if any DDL statement fails.
pub async fn run_migrations(pool: &PgPool, config: &PostgresConfig) -> Result<(), sqlx::Error> {
    let rules_table = config.rules_table();
    let version_table = config.version_table();
    let stats_table = config.cache_stats_table();
    let bump_function = config.bump_function();
    let bump_trigger = config.bump_trigger();

    let create_schema = format!("CREATE SCHEMA IF NOT EXISTS {}", config.schema);

    let create_rules = format!(
        "CREATE TABLE IF NOT EXISTS {rules_table} (
            id BIGINT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL DEFAULT '',
            rule_type TEXT NOT NULL,
            priority INTEGER NOT NULL DEFAULT 0,
            conditions JSONB NOT NULL DEFAULT '{{}}'::jsonb,
            content JSONB NOT NULL DEFAULT 'null'::jsonb,
            enabled BOOLEAN NOT NULL DEFAULT TRUE,
            description TEXT,
            confidence_prior DOUBLE PRECISION NOT NULL DEFAULT 0.5,
            mutually_exclusive_group TEXT,
            contradicts BIGINT[] NOT NULL DEFAULT '{{}}',
            tags TEXT[] NOT NULL DEFAULT '{{}}',
            segment_weights JSONB NOT NULL DEFAULT '{{}}'::jsonb,
            biz_impact_weight DOUBLE PRECISION NOT NULL DEFAULT 1.0,
            history_score DOUBLE PRECISION NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"
    );

    let create_rules_idx = format!(
        "CREATE INDEX IF NOT EXISTS {}rules_type_enabled_idx ON {rules_table} (rule_type, enabled)",
        config.table_prefix
    );

    let create_version = format!(
        "CREATE TABLE IF NOT EXISTS {version_table} (
            id SMALLINT PRIMARY KEY DEFAULT 1 CHECK (id = 1),
            rule_version BIGINT NOT NULL DEFAULT 1,
            content_version BIGINT NOT NULL DEFAULT 0,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"
    );

    let seed_version = format!(
        "INSERT INTO {version_table} (id, rule_version) VALUES (1, 1) ON CONFLICT (id) DO NOTHING"
    );

    let create_stats = format!(
        "CREATE TABLE IF NOT EXISTS {stats_table} (
            stat_date DATE NOT NULL,
            tier TEXT NOT NULL,
            hits BIGINT NOT NULL DEFAULT 0,
            misses BIGINT NOT NULL DEFAULT 0,
            PRIMARY KEY (stat_date, tier)
        )"
    );

    let create_bump_function = format!(
        "CREATE OR REPLACE FUNCTION {bump_function}() RETURNS trigger AS $$
        BEGIN
            UPDATE {version_table}
               SET rule_version = rule_version + 1, updated_at = NOW()
             WHERE id = 1;
            RETURN NULL;
        END;
        $$ LANGUAGE plpgsql"
    );

    let drop_trigger = format!("DROP TRIGGER IF EXISTS {bump_trigger} ON {rules_table}");

    let create_trigger = format!(
        "CREATE TRIGGER {bump_trigger}
            AFTER INSERT OR UPDATE OR DELETE ON {rules_table}
            FOR EACH STATEMENT EXECUTE FUNCTION {bump_function}()"
    );

    sqlx::query(&create_schema).execute(pool).await?;
    sqlx::query(&create_rules).execute(pool).await?;
    sqlx::query(&create_rules_idx).execute(pool).await?;
    sqlx::query(&create_version).execute(pool).await?;
    sqlx::query(&seed_version).execute(pool).await?;
    sqlx::query(&create_stats).execute(pool).await?;
    sqlx::query(&create_bump_function).execute(pool).await?;
    sqlx::query(&drop_trigger).execute(pool).await?;
    sqlx::query(&create_trigger).execute(pool).await?;

    Ok(())
}
