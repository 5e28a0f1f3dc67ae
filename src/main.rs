//! Dify API relay.
//!
//! Serves per-application Dify resources to clients without exposing the
//! application keys: the relay looks the app up, calls the Dify API with the
//! app's bearer key and hands the JSON answer back.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌───────────────────────────────────────────────┐
//!                     │                   RELAY                        │
//!   Client Request    │  ┌────────┐    ┌──────────┐    ┌───────────┐  │
//!  ───────────────────┼─▶│  http  │───▶│  relay   │───▶│ registry  │  │
//!                     │  │ routes │    │  engine  │    │  lookup   │  │
//!                     │  └────────┘    └────┬─────┘    └───────────┘  │
//!                     │                     │                         │
//!                     │                     ▼                         │
//!   Client Response   │  ┌────────┐    ┌──────────┐                   │
//!  ◀──────────────────┼──│response│◀───│ upstream │◀──────────────────┼──── Dify API
//!                     │  └────────┘    └──────────┘                   │
//!                     │                                               │
//!                     │  config (TOML + hot reload) · observability   │
//!                     │  lifecycle (signals, graceful shutdown)       │
//!                     └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use dify_relay::config::{load_config, RelayConfig};
use dify_relay::lifecycle::{signals, startup, Shutdown};
use dify_relay::observability::logging;

#[derive(Parser)]
#[command(name = "dify-relay")]
#[command(about = "Relay for per-application Dify API resources", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload the app table when the config file changes.
    #[arg(short, long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };

    logging::init_logging(&config.observability)?;
    tracing::info!("dify-relay v{} starting", env!("CARGO_PKG_VERSION"));

    if cli.config.is_none() {
        tracing::warn!("No config file given; running with defaults and no registered apps");
    }

    let options = startup::StartupOptions {
        watch_path: cli.config.filter(|_| cli.watch),
    };

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(&shutdown);

    startup::run(config, options, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
