//! Volleyball store - service bootstrap.
//!
//! Opens the pool, brings the schema up to date, verifies health, and then
//! waits for shutdown. The HTTP layer embeds the same `Store` handle; this
//! binary is the standalone lifecycle around it.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use volleystore::Config;
use volleystore::Store;

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_thread_ids(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    init_tracing(&config);

    info!(
        statement_timeout_secs = config.statement_timeout,
        "Starting volleystore v{}",
        env!("CARGO_PKG_VERSION")
    );

    let store = match Store::connect(&config).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "Failed to open the store");
            return Err(e.into());
        }
    };

    let report = store.health_check().await;
    if !report.ok {
        error!(detail = %report.detail, "Store is unhealthy at startup");
        store.close().await;
        return Err(report.detail.into());
    }
    info!(detail = %report.detail, "Store ready");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    store.close().await;
    info!("Shutdown complete");
    Ok(())
}
