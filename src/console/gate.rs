//! Transmit gate.
//!
//! Replies are only delivered while the peer has notifications enabled on
//! the outbound channel. Chunks produced while the gate is closed are
//! discarded, never queued: a later subscription does not replay them.

use super::framing::ResponseChunk;
use crate::transport::{PeerId, Transport, TransportError};
use log::{debug, warn};

/// What happened to the chunks of one reply.
#[derive(Debug)]
pub enum EmitOutcome {
    /// All chunks were handed to the transport.
    Sent(usize),
    /// Gate was closed; nothing was sent.
    Dropped(usize),
    /// The transport failed part way; remaining chunks were abandoned.
    Failed {
        sent: usize,
        abandoned: usize,
        error: TransportError,
    },
}

/// Tracks the active output target of one connection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransmitGate {
    target: Option<PeerId>,
}

impl TransmitGate {
    /// Create a closed gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the gate towards `peer`, replacing any previous target.
    pub fn subscribe(&mut self, peer: PeerId) {
        if let Some(previous) = self.target.replace(peer) {
            if previous != peer {
                debug!("Transmit target {} replaced by {}", previous, peer);
            }
        }
    }

    /// Close the gate.
    pub fn unsubscribe(&mut self) {
        self.target = None;
    }

    /// Current output target.
    pub fn target(&self) -> Option<PeerId> {
        self.target
    }

    /// Check if chunks would be delivered.
    pub fn is_open(&self) -> bool {
        self.target.is_some()
    }

    /// Hand chunks to the transport in order, or drop them if closed.
    pub fn emit(&self, transport: &dyn Transport, chunks: &[ResponseChunk]) -> EmitOutcome {
        let Some(peer) = self.target else {
            debug!("Not subscribed, dropping {} chunk(s)", chunks.len());
            return EmitOutcome::Dropped(chunks.len());
        };

        for (sent, chunk) in chunks.iter().enumerate() {
            if let Err(error) = transport.send(peer, chunk.as_bytes()) {
                warn!("Send to {} failed after {} chunk(s): {}", peer, sent, error);
                return EmitOutcome::Failed {
                    sent,
                    abandoned: chunks.len() - sent,
                    error,
                };
            }
        }
        EmitOutcome::Sent(chunks.len())
    }
}
