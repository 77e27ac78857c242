//! Dealership back-office BFF
//!
//! Sits between the browser admin panel and the external dealership API.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                       BFF                        │
//!                         │                                                  │
//!     Browser request     │  ┌─────────┐   ┌──────────┐   ┌──────────────┐   │
//!     ────────────────────┼─▶│  http   │──▶│ handlers │──▶│  validation  │   │
//!                         │  │ server  │   │ + session│   │  + sales     │   │
//!                         │  └─────────┘   └──────────┘   └──────┬───────┘   │
//!                         │                                      │           │
//!                         │                                      ▼           │
//!     Browser response    │  ┌─────────┐   ┌──────────┐   ┌──────────────┐   │
//!     ◀───────────────────┼──│ ApiError│◀──│normalize │◀──│   upstream   │◀──┼── Dealership
//!                         │  │  / JSON │   │          │   │    client    │   │   REST API
//!                         │  └─────────┘   └──────────┘   └──────────────┘   │
//!                         │                                                  │
//!                         │  config (+watcher) · observability · security    │
//!                         │  lifecycle · admin                               │
//!                         └──────────────────────────────────────────────────┘
//! ```

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use dealer_bff::config::{load_from_env, watcher::ConfigWatcher};
use dealer_bff::lifecycle::{spawn_signal_handler, Shutdown};
use dealer_bff::observability::{logging, metrics};
use dealer_bff::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, config_path) = match load_from_env() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("dealer-bff: {e}");
            std::process::exit(2);
        }
    };

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "dealer-bff starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        storefront = config.storefront.enabled,
        config_file = ?config_path,
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

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // The watcher must outlive the server.
    let (_watcher, config_updates) = match &config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let shutdown = Shutdown::new();
    spawn_signal_handler(&shutdown);

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
