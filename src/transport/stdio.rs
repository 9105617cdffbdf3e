//! Line transport over stdin/stdout.
//!
//! Stands in for the BLE peripheral during development: one local peer is
//! connected and subscribed at start, every stdin line is a write, and each
//! outbound chunk is printed on its own line, the way a BLE client sees one
//! notification per chunk.

use super::{PeerId, Transport, TransportError, TransportEvent};
use log::{debug, info};
use std::io::{BufRead, Write};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// The single peer served by the stdio transport.
pub const LOCAL_PEER: PeerId = PeerId(0);

/// Transport writing chunks to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdioTransport;

impl StdioTransport {
    /// Create a stdio transport.
    pub fn new() -> Self {
        Self
    }

    /// Read stdin on a blocking task and feed events to the console.
    ///
    /// Emits `Connected` and `SubscriptionChanged` for [`LOCAL_PEER`] first
    /// and `Disconnected` at end of input. The task stops early if `cancel`
    /// fires or the console stops listening.
    pub fn spawn_reader(
        events: mpsc::Sender<TransportEvent>,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::task::spawn_blocking(move || {
            let opening = [
                TransportEvent::Connected(LOCAL_PEER),
                TransportEvent::SubscriptionChanged {
                    peer: LOCAL_PEER,
                    subscribed: true,
                },
            ];
            for event in opening {
                if events.blocking_send(event).is_err() {
                    return;
                }
            }

            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                if cancel.is_cancelled() {
                    break;
                }
                let line = match line {
                    Ok(line) => line,
                    Err(e) => {
                        info!("Stopped reading stdin: {}", e);
                        break;
                    }
                };
                let event = TransportEvent::Write {
                    peer: LOCAL_PEER,
                    data: line.into_bytes(),
                };
                if events.blocking_send(event).is_err() {
                    debug!("Console stopped, ending stdin reader");
                    return;
                }
            }

            let _ = events.blocking_send(TransportEvent::Disconnected(LOCAL_PEER));
        })
    }
}

impl Transport for StdioTransport {
    fn send(&self, peer: PeerId, chunk: &[u8]) -> Result<(), TransportError> {
        if peer != LOCAL_PEER {
            return Err(TransportError::PeerGone(peer));
        }
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(chunk)?;
        stdout.write_all(b"\n")?;
        stdout.flush()?;
        Ok(())
    }
}
