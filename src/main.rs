//! POAP transfer feed (v1)
//!
//! Streams POAP `Transfer` events from xDai and mainnet to WebSocket clients.
//!
//! # Architecture Overview
//!
//! ```text
//!   xDai node ──ws──▶ ┌────────────────────┐
//!                     │ NetworkSubscriber  │──┐
//!                     │ decode → dedupe    │  │    ┌──────────┐    ┌──────────────┐
//!                     └────────────────────┘  ├──▶ │ Enricher │──▶ │ BroadcastHub │──▶ clients
//!   mainnet node ─ws─▶ ┌────────────────────┐  │    │ REST API │    │  (axum ws)   │
//!                     │ NetworkSubscriber  │──┘    └──────────┘    └──────────────┘
//!                     └────────────────────┘
//!
//!   Cross-cutting: config (TOML + env) · observability (tracing, metrics)
//!                  resilience (reconnect, retries) · lifecycle (startup, signals)
//! ```

use std::path::PathBuf;

use clap::Parser;

use poap_feed::config::loader::load_config;
use poap_feed::lifecycle::signals::wait_for_signal;
use poap_feed::observability::{logging, metrics};
use poap_feed::{Feed, Shutdown};

#[derive(Parser)]
#[command(name = "poap-feed")]
#[command(about = "Real-time POAP transfer feed over WebSocket", long_about = None)]
#[command(version)]
struct Args {
    /// Path to a TOML config file; environment variables override it
    #[arg(short, long, env = "POAP_FEED_CONFIG")]
    config: Option<PathBuf>,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let config = load_config(args.config.as_deref())?;
    if args.check {
        println!("Configuration OK");
        return Ok(());
    }

    logging::init_logging(&config.observability);
    tracing::info!("poap-feed v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        contract = %config.contract.address,
        api = %config.api.base_url,
        settle_delay_ms = config.enrichment.settle_delay_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    let feed = Feed::start(&config, shutdown).await?;
    feed.run(async {
        wait_for_signal().await;
    })
    .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
