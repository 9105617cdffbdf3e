//! Remote text console for configuring WiFi on a headless device.
//!
//! A client connects over a narrow link (normally BLE), writes command lines
//! such as `list` or `conn 0 secret`, and receives `code: <status>` replies
//! split into transport-sized chunks.
//!
//! Everything except the radio stack lives here and can be tested on the
//! host: the transport is a trait seam and external tools run through a
//! [`CommandExecutor`].

pub mod config;
pub mod console;
pub mod executor;
pub mod server;
pub mod stats;
pub mod transport;
pub mod wifi;

// Re-export commonly used items
pub use config::{ConfigError, ConsoleConfig};
pub use console::{tokenize, Dispatcher, ParseError, Reply, ResponseFramer, Session};
pub use executor::{CommandExecutor, ExecOutput, SystemExecutor};
pub use server::{ConsoleServer, ServerError};
pub use stats::ConsoleStats;
pub use transport::{PeerId, StdioTransport, Transport, TransportError, TransportEvent};
pub use wifi::NetworkCandidate;

#[cfg(feature = "stats-server")]
pub use stats::StatsServer;
