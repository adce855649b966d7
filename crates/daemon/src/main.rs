//! Ticketline - Main Entry Point
//! Queue engine + JSON-RPC server + stale ticket sweeper

mod settings;

use anyhow::{Context, Result};
use settings::{LogFormat, Settings};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ticketline_api_rpc::RpcServer;
use ticketline_core::application::{
    shutdown_channel, NotificationHub, QueueEngine, StaleTicketSweeper,
};
use ticketline_core::port::id_provider::UuidProvider;
use ticketline_core::port::time_provider::SystemTimeProvider;
use ticketline_infra_sqlite::{create_pool, run_migrations, SqliteQueueStore};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_LOG_FILTER: &str = "ticketline=info";
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load configuration
    let settings = Settings::load()?;

    // 2. Initialize logging
    init_logging(settings.logging.format)?;
    info!("Ticketline v{} starting...", VERSION);

    // 3. Initialize database
    if !settings.database.is_in_memory() {
        let db_path = settings.database.expanded_path();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory {}", parent.display())
            })?;
        }
        info!(db_path = %db_path.display(), "Initializing database...");
    } else {
        warn!("Using an in-memory database; tickets are lost on exit");
    }

    let pool = create_pool(&settings.database.url(), settings.database.max_connections)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 4. Setup dependencies (DI wiring)
    let time_provider = Arc::new(SystemTimeProvider);
    let id_provider = Arc::new(UuidProvider);
    let store = Arc::new(SqliteQueueStore::new(pool.clone()));
    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    let (hub, hub_handle) = NotificationHub::spawn(settings.hub.clone(), shutdown_rx.clone());
    let engine = Arc::new(QueueEngine::new(
        store,
        Arc::new(hub),
        time_provider,
        settings.queue.clone(),
    ));

    // 5. Start stale ticket sweeper
    let sweeper = StaleTicketSweeper::new(engine.clone(), settings.sweep.clone());
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown_rx.clone()));

    // 6. Start JSON-RPC server
    info!("Starting JSON-RPC server...");
    let rpc_server = RpcServer::new(settings.server.clone(), engine, id_provider, shutdown_rx);
    let (addr, rpc_handle) = rpc_server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!(%addr, "System ready. Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");

    // 8. Graceful shutdown: sessions and sweeper first, then the listener
    shutdown_tx.shutdown();
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;
    let _ = tokio::time::timeout(SHUTDOWN_GRACE, rpc_handle.stopped()).await;
    let _ = tokio::time::timeout(SHUTDOWN_GRACE, sweeper_handle).await;
    let _ = tokio::time::timeout(SHUTDOWN_GRACE, hub_handle).await;
    pool.close().await;

    info!("Shutdown complete.");

    Ok(())
}

/// JSON for production, pretty for development
fn init_logging(format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_FILTER))
        .context("Failed to create env filter")?;

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
    }
    .context("Failed to install tracing subscriber")
}
