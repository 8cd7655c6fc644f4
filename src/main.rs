//! Load-balancing reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────┐
//!                          │               REVERSE BALANCER               │
//!                          │                                              │
//!     Client Request       │  ┌─────────┐    ┌──────────┐    ┌─────────┐  │
//!     ─────────────────────┼─▶│  http   │───▶│ dispatch │───▶│  pool   │  │
//!                          │  │ server  │    │ (select, │    │ (rr /   │  │
//!                          │  └─────────┘    │  count)  │    │  least) │  │
//!                          │                 └────┬─────┘    └────▲────┘  │
//!                          │                      │               │       │
//!     Client Response      │                      ▼               │       │
//!     ◀────────────────────┼──────────────── hyper client ────────┼───────┼──▶ Backend
//!                          │                                      │       │
//!                          │  ┌─────────┐    ┌──────────────┐     │       │
//!     Admin calls ─────────┼─▶│  admin  │───▶│ health check │─────┘       │
//!                          │  └─────────┘    │ (ticker too) │             │
//!                          │                 └──────────────┘             │
//!                          └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use clap::Parser;

use reverse_balancer::config::load_config;
use reverse_balancer::lifecycle::startup;
use reverse_balancer::observability::logging;

#[derive(Parser)]
#[command(name = "reverse-balancer")]
#[command(about = "Load-balancing reverse proxy with health checks", long_about = None)]
struct Cli {
    /// Path to the JSON or TOML configuration file.
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Missing or malformed configuration aborts startup.
    let config = load_config(&cli.config)?;

    logging::init_logging(&config.log_level);
    tracing::info!(config = %cli.config.display(), "reverse-balancer v{} starting", env!("CARGO_PKG_VERSION"));

    startup::run(config).await?;
    Ok(())
}
