//! Penumbra Pulse - Analytics Service Runtime
//!
//! This binary wires the full service together:
//! - Loads configuration from environment variables
//! - Builds the RPC and pindexer clients and the snapshot store
//! - Spawns the metrics/health HTTP server
//! - Spawns the collection loop and the digest loop
//! - Runs until Ctrl+C
//!
//! Usage:
//!   cargo run --release --bin pulse
//!
//! Environment variables:
//!   PENUMBRA_RPC_ENDPOINT - CometBFT RPC base URL (required)
//!   DISCORD_WEBHOOK_URL - Digest webhook (required)
//!   PENUMBRA_INDEXER_URL - pindexer Postgres URL (optional)
//!   INDEXER_CA_CERT - CA certificate path for indexer TLS (optional)
//!   METRICS_PORT - HTTP port (default: 8081)
//!   UPDATE_INTERVAL_SECONDS - Collection cadence (default: 30)
//!   DISCORD_INTERVAL_HOURS - Digest cadence (default: 3)

use dotenv::dotenv;
use log::{error, info};
use penumbra_pulse::{
    digest, server, Collector, Config, DiscordNotifier, DriftEstimator, NotificationSink,
    PindexerClient, RpcClient, SnapshotStore,
};
use std::sync::Arc;
use std::time::Instant;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize environment and logging
    dotenv().ok();
    env_logger::init();

    info!("🚀 Penumbra Pulse - Analytics Service");

    let config = Config::from_env()?;

    info!("✅ Configuration loaded");
    info!("   ├─ RPC endpoint: {}", config.rpc_endpoint);
    info!(
        "   ├─ Indexer: {}",
        if config.indexer_url.is_some() {
            "configured"
        } else {
            "disabled (estimating trading data)"
        }
    );
    info!("   ├─ Metrics port: {}", config.metrics_port);
    info!(
        "   ├─ Collection interval: {}s",
        config.update_interval.as_secs()
    );
    info!(
        "   └─ Digest interval: {:.1}h",
        config.digest_interval.as_secs_f64() / 3600.0
    );

    let started_at = Instant::now();
    let store = Arc::new(SnapshotStore::new());

    let primary = RpcClient::new(
        &config.rpc_endpoint,
        config.blocks_per_epoch,
        config.um_price_usd,
        config.fetch_timeout,
    )?;
    let auxiliary = PindexerClient::new(
        config.indexer_url.as_deref(),
        config.indexer_ca_cert.as_deref(),
    )?;
    let collector = Collector::new(
        primary,
        auxiliary,
        DriftEstimator,
        store.clone(),
        config.fetch_timeout,
    );

    let notifier: Arc<dyn NotificationSink> = Arc::new(DiscordNotifier::new(
        config.discord_webhook_url.clone(),
        config.fetch_timeout,
    ));

    // HTTP surface
    let server_store = store.clone();
    let metrics_port = config.metrics_port;
    tokio::spawn(async move {
        if let Err(e) = server::serve(server_store, metrics_port, started_at).await {
            error!("❌ Metrics server failed: {}", e);
        }
    });

    // Collection loop
    let update_interval = config.update_interval;
    tokio::spawn(async move {
        collector.run(update_interval).await;
    });

    // Digest loop
    let digest_store = store.clone();
    let digest_interval = config.digest_interval;
    tokio::spawn(async move {
        digest::run_digest_loop(digest_store, notifier, digest_interval).await;
    });

    info!("✅ All tasks spawned, service running");

    tokio::signal::ctrl_c().await?;
    info!("🛑 Shutdown signal received, exiting");

    Ok(())
}
