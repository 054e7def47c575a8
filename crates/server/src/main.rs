use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use augur_engine::{Engine, VersionTracker};
use augur_rules::RuleIndex;
use augur_server::api::AppState;
use augur_server::config::AugurConfig;

/// Augur rule matching HTTP server.
#[derive(Parser, Debug)]
#[command(name = "augur-server", about = "Standalone HTTP server for Augur")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "augur.toml")]
    config: String,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the rule store schema, then exit.
    Migrate,
    /// Compile every enabled stored rule and report malformed ones, then exit.
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (config, found) = AugurConfig::load(&cli.config)?;
    augur_server::telemetry::init(&config.logging);
    if !found {
        info!(path = %cli.config, "config file not found, using defaults");
    }

    match cli.command {
        Some(Commands::Migrate) => return run_migrate(&config).await,
        Some(Commands::Validate) => return run_validate(&config).await,
        None => {}
    }

    let store = augur_server::store_factory::create_store(&config.store).await?;
    let adapters = augur_server::adapter_factory::create_adapters(&config.adapters)?;

    let mut builder = Engine::builder()
        .store(store)
        .cache_config(config.cache.cache_config())
        .ranking_weights(config.ranking);
    if let Some(l2) = augur_server::cache_factory::create_shared_cache(&config.cache)? {
        builder = builder.shared_cache(l2);
    }
    for (name, adapter) in adapters {
        builder = builder.adapter(name, adapter);
    }
    let engine = builder.build().await?;
    info!(
        version = engine.version(),
        rules = engine.index().len(),
        adapters = ?engine.adapters(),
        "engine ready"
    );

    let (tracker, tracker_shutdown) =
        VersionTracker::new(engine.clone(), config.tracker.tracker_config());
    let tracker_handle = tracker.spawn();

    let app = augur_server::api::router(AppState { engine });

    // Resolve the bind address (CLI overrides take precedence).
    let host = cli.host.unwrap_or(config.server.host);
    let port = cli.port.unwrap_or(config.server.port);
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "augur-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    info!(
        timeout_secs = config.server.shutdown_timeout_seconds,
        "stopping version tracker"
    );
    if tracker_shutdown.send(()).await.is_err() {
        warn!("version tracker already stopped");
    }
    match tokio::time::timeout(shutdown_timeout, tracker_handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "version tracker task failed"),
        Err(_) => warn!("shutdown timeout exceeded, cache statistics may be lost"),
    }

    info!("augur-server stopped");
    Ok(())
}

/// Run the `migrate` subcommand: create the rule store schema and exit.
async fn run_migrate(config: &AugurConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.store.backend != "postgres" {
        info!(backend = %config.store.backend, "store backend has no schema, nothing to migrate");
        return Ok(());
    }
    info!("running rule store migrations...");
    let _store = augur_server::store_factory::create_store(&config.store).await?;
    info!("rule store migrations complete");
    Ok(())
}

/// Run the `validate` subcommand: compile all enabled rules and report the
/// malformed ones. Fails if any rule does not compile.
async fn run_validate(config: &AugurConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = augur_server::store_factory::create_store(&config.store).await?;
    let snapshot = store.load_enabled_rules().await?;
    let total = snapshot.rules.len();
    let index = RuleIndex::build(snapshot.version.rule_version, snapshot.rules);

    for malformed in index.malformed() {
        println!("{} (id {}): {}", malformed.code, malformed.id, malformed.reason);
    }
    println!(
        "version {}: {} of {total} enabled rules compiled, {} malformed",
        index.version(),
        index.len(),
        index.malformed().len()
    );

    if index.malformed().is_empty() {
        Ok(())
    } else {
        Err(format!("{} malformed rules", index.malformed().len()).into())
    }
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
