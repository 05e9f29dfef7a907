//! Book lending service.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ http (axum, request id, tracing)
//!                │
//!                ▼
//!           lending::BorrowCoordinator
//!             │                     │
//!             ▼                     ▼
//!   inventory (row locks)   pricing::ResilientPriceClient
//!                             retry ─▶ circuit breaker ─▶ deadline ─▶ HTTP price source
//!                             fallback price when nothing succeeds
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use book_lending::config::{load_config, ServiceConfig};
use book_lending::lifecycle::{build_coordinator, signals, Shutdown};
use book_lending::observability::{logging, metrics};
use book_lending::HttpServer;

#[derive(Parser)]
#[command(name = "book-lending")]
#[command(about = "Book lending service with resilient pricing", long_about = None)]
struct Args {
    /// Path to a TOML config file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured instance name
    #[arg(long)]
    instance_name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };
    if let Some(name) = args.instance_name {
        config.instance_name = name;
    }

    logging::init(&config.observability.log_level);
    tracing::info!("book-lending v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        instance = %config.instance_name,
        bind_address = %config.listener.bind_address,
        pricing_url = %config.pricing.base_url,
        max_attempts = config.retries.max_attempts,
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

    let coordinator = build_coordinator(&config).await?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(coordinator, &config.listener);
    let serve = tokio::spawn(server.run(listener, shutdown.subscribe()));

    signals::wait_for_signal(&shutdown).await;
    serve.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
