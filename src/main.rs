//! Backend failover service (v1)
//!
//! Connects to a clustered storage backend, falls back to a single node
//! when the cluster is unavailable, and keeps watching backend and host
//! health until shut down.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │                     BACKEND FAILOVER                          │
//!   │                                                               │
//!   │  ┌────────────┐  connect(mode)   ┌─────────────────────┐     │
//!   │  │ lifecycle  │─────────────────▶│ ConnectionManager   │─────┼──▶ Primary (seed list)
//!   │  │  startup   │                  │  mode + handle      │─────┼──▶ Fallback (single node)
//!   │  └─────┬──────┘                  └──────────▲──────────┘     │
//!   │        │ start                      failover│  get_handle    │
//!   │        ▼                                    │                │
//!   │  ┌────────────┐   checks + thermal  ┌───────┴──────┐         │
//!   │  │   health   │────────────────────▶│ HealthMonitor│         │
//!   │  │  control   │                     └──────────────┘         │
//!   │  └────────────┘                                              │
//!   │  ┌──────────────────────────────────────────────────────┐    │
//!   │  │ Cross-cutting: config · observability · resilience   │    │
//!   │  │                admin API                             │    │
//!   │  └──────────────────────────────────────────────────────┘    │
//!   └──────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use backend_failover::config::{load_config, FailoverConfig};
use backend_failover::lifecycle::{signals, Service};
use backend_failover::observability::{logging, metrics};
use backend_failover::OperatingMode;

#[derive(Parser)]
#[command(name = "backend-failover")]
#[command(about = "Backend connection failover service", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file (defaults are used when omitted).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Mode to request at startup, overriding `backend.default_mode`.
    #[arg(short, long)]
    mode: Option<OperatingMode>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => FailoverConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "backend-failover starting");

    tracing::info!(
        primary_seeds = ?config.backend.primary_seeds,
        fallback_address = %config.backend.fallback_address,
        interval_secs = config.health.interval_secs,
        critical_temperature_celsius = config.health.critical_temperature_celsius,
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

    let mode = cli.mode.unwrap_or(config.backend.default_mode);
    let service = match Service::start(&config, mode).await {
        Ok(service) => service,
        Err(e) => {
            tracing::error!(severity = "critical", error = %e, "Startup failed");
            return Err(e.into());
        }
    };

    signals::wait_for_shutdown_signal().await;
    service.shutdown().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
