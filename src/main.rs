//! Resilient API gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────┐
//!                         │                  GATEWAY                      │
//!     Client Request      │  ┌─────────┐    ┌──────────┐                  │
//!     ────────────────────┼─▶│  http   │───▶│ handlers │                  │
//!                         │  │ server  │    └────┬─────┘                  │
//!                         │  └─────────┘         │                        │
//!                         │          ┌───────────┴────────────┐           │
//!                         │          ▼                        ▼           │
//!                         │  ┌───────────────┐      ┌──────────────────┐  │
//!                         │  │ retry+timeout │      │ circuit breaker  │  │
//!                         │  │   (orders)    │      │ + fallback (pay) │  │
//!                         │  └───────┬───────┘      └────────┬─────────┘  │
//!                         └──────────┼───────────────────────┼────────────┘
//!                                    ▼                       ▼
//!                             Orders service          Payments service
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use resilient_gateway::config::{default_config, load_config};
use resilient_gateway::lifecycle::{shutdown_signal, Shutdown};
use resilient_gateway::observability::{init_logging, init_metrics};
use resilient_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "resilient-gateway")]
#[command(about = "API gateway with circuit breaking, retries and timeouts", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults plus environment overrides when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => default_config()?,
    };

    init_logging(&config.observability)?;
    tracing::info!("resilient-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        orders_url = %config.services.orders_url,
        payments_url = %config.services.payments_url,
        breaker_timeout_ms = config.breaker.timeout_ms,
        error_threshold = config.breaker.error_threshold_percentage,
        reset_timeout_ms = config.breaker.reset_timeout_ms,
        retry_attempts = config.retry.max_attempts,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    shutdown_signal().await;
    shutdown.trigger();

    server_task.await??;
    tracing::info!("Shutdown complete");
    Ok(())
}
