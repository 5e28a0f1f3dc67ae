//! Startup orchestration.
//!
//! Order: metrics exporter, config watcher, listener, then serve. Any
//! failure before serving is fatal.

use std::path::PathBuf;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::config::{ConfigWatcher, RelayConfig};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::metrics;

/// Startup options gathered from the command line.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    /// Config file to watch for app table changes.
    pub watch_path: Option<PathBuf>,
}

/// Bring the relay up and serve until `shutdown` fires.
pub async fn run(
    config: RelayConfig,
    options: StartupOptions,
    shutdown: &Shutdown,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        apps = config.apps.len(),
        upstream_timeout_secs = ?config.upstream.timeout_secs,
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

    // The watcher handle must outlive the server.
    let (_watcher, config_updates) = match options.watch_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(&path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config)?;
    server
        .run(listener, config_updates, shutdown.subscribe())
        .await?;

    Ok(())
}
