//! Transport seam.
//!
//! The console does not drive the radio. A transport (BLE peripheral stack,
//! or the development line transport in [`stdio`]) reports what happens on
//! the link as [`TransportEvent`]s and accepts outbound chunks through the
//! [`Transport`] trait.
//!
//! # Events
//!
//! ```text
//! Connected(peer)                  -> new session
//! SubscriptionChanged(peer, bool)  -> open/close the transmit gate
//! Write(peer, bytes)               -> one command line
//! Disconnected(peer)               -> session dropped
//! ```

pub mod stdio;

use std::fmt;

pub use stdio::StdioTransport;

/// Transport-assigned identifier of one remote connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub u64);

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "peer#{}", self.0)
    }
}

/// Something that happened on the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A remote device connected.
    Connected(PeerId),
    /// A remote device disconnected.
    Disconnected(PeerId),
    /// The peer enabled or disabled notifications on the outbound channel.
    SubscriptionChanged { peer: PeerId, subscribed: bool },
    /// The peer wrote one command line to the inbound channel.
    Write { peer: PeerId, data: Vec<u8> },
}

impl TransportEvent {
    /// The peer this event belongs to.
    pub fn peer(&self) -> PeerId {
        match self {
            Self::Connected(peer) | Self::Disconnected(peer) => *peer,
            Self::SubscriptionChanged { peer, .. } | Self::Write { peer, .. } => *peer,
        }
    }
}

/// Errors reported by a transport when sending.
#[derive(Debug)]
pub enum TransportError {
    /// The peer is no longer connected.
    PeerGone(PeerId),
    /// Chunk exceeds what the link accepts.
    ChunkTooLarge { len: usize, max: usize },
    /// Underlying I/O failure.
    Io(std::io::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PeerGone(peer) => write!(f, "{} is not connected", peer),
            Self::ChunkTooLarge { len, max } => {
                write!(f, "chunk too large: {} bytes (max {})", len, max)
            }
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Outbound side of the link.
pub trait Transport: Send + Sync + 'static {
    /// Notify one chunk to a peer.
    fn send(&self, peer: PeerId, chunk: &[u8]) -> Result<(), TransportError>;

    /// Drop a peer after an unrecoverable fault in its session.
    fn close(&self, _peer: PeerId) {}
}
