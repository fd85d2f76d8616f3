//! Sync daemon entrypoint
//!
//! Wires configuration, logging, and the two stores, bootstraps the
//! sequence counter, and runs the sync worker until ctrl-c.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tracing::info;

use snaplink::config::AppConfig;
use snaplink::faststore::FastStoreFactory;
use snaplink::services::SyncWorker;
use snaplink::storage::StorageFactory;
use snaplink::system::logging::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load();
    let _log_guard = init_logging(&config.logging);

    info!("Starting snaplink sync daemon");

    let store = StorageFactory::create(&config.database)
        .await
        .context("durable store initialization failed")?;
    let fast = FastStoreFactory::create(&config.fast_store)
        .context("fast store initialization failed")?;

    store
        .ensure_counter(&config.sequence.counter_name)
        .await
        .context("sequence counter bootstrap failed")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker = SyncWorker::new(
        Arc::clone(&fast),
        Arc::clone(&store),
        Duration::from_secs(config.sync.interval_seconds),
        shutdown_rx,
    );
    let worker_handle = tokio::spawn(worker.run());

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("Shutdown signal received");

    shutdown_tx.send(true).ok();
    worker_handle.await.ok();

    info!("Snaplink sync daemon stopped");
    Ok(())
}
