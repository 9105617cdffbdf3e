//! WiFi console binary.
//!
//! Runs the console against the stdin/stdout line transport, which behaves
//! like a single BLE client that is connected and subscribed:
//!
//! ```bash
//! cargo run --bin ble-wifi-console
//! > list
//! > conn 0 "my password"
//! ```
//!
//! Settings come from `BLE_CONSOLE_*` environment variables (see
//! `ble_wifi_console::config`). Logging goes to stderr via `RUST_LOG`.

use ble_wifi_console::{ConsoleConfig, ConsoleServer, StdioTransport, SystemExecutor};
use log::{error, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Inbound events buffered between the transport and the console.
const EVENT_QUEUE_DEPTH: usize = 32;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("=== BLE WiFi console starting ===");

    let config = match ConsoleConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Chunk size {} bytes, nmcli: {}, ip: {}",
        config.chunk_size, config.nmcli_program, config.ip_program
    );

    let server = match ConsoleServer::new(
        &config,
        Arc::new(SystemExecutor::new()),
        Arc::new(StdioTransport::new()),
    ) {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to start console: {}", e);
            std::process::exit(1);
        }
    };

    // Keep server alive - variable intentionally unused except for Drop
    #[cfg(feature = "stats-server")]
    let _stats_server = config.stats_port.and_then(|port| {
        match ble_wifi_console::StatsServer::start(None, port, server.stats()) {
            Ok(stats_server) => Some(stats_server),
            Err(e) => {
                warn!("Failed to start stats server: {}", e);
                None
            }
        }
    });
    #[cfg(not(feature = "stats-server"))]
    {
        if config.stats_port.is_some() {
            warn!("Stats port set but the stats-server feature is disabled");
        }
    }

    let cancel = CancellationToken::new();
    let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
    let reader = StdioTransport::spawn_reader(events_tx, cancel.clone());
    let console = tokio::spawn(server.run(events_rx, cancel.clone()));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down...");
            cancel.cancel();
        }
        result = console => {
            if let Err(e) = result {
                error!("Console task error: {}", e);
            }
        }
    }

    // The stdin reader may be parked in a blocking read; don't wait for it
    drop(reader);
    info!("Shutdown complete");
    std::process::exit(0);
}
