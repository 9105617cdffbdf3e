//! Command protocol layer.
//!
//! # Components
//!
//! - [`tokenizer`] - command line to tokens (quoting and escaping)
//! - [`command`] - command table and help text
//! - [`session`] - per-connection state (last network list)
//! - [`dispatcher`] - tokens to [`Reply`]
//! - [`framing`] - [`Reply`] to transport-sized chunks
//! - [`gate`] - delivers chunks only while the peer is subscribed

pub mod command;
pub mod dispatcher;
pub mod framing;
pub mod gate;
pub mod session;
pub mod tokenizer;

pub use command::{CommandKind, HELP_TEXT};
pub use dispatcher::{Dispatcher, BAD_FORMAT, UNKNOWN_COMMAND};
pub use framing::{FrameError, Reply, ResponseChunk, ResponseFramer, DEFAULT_CHUNK_SIZE};
pub use gate::{EmitOutcome, TransmitGate};
pub use session::Session;
pub use tokenizer::{tokenize, ParseError};
