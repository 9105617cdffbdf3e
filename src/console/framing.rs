//! Response framing.
//!
//! The outbound characteristic carries at most one chunk per notification,
//! so each reply is rendered to text and split into bounded chunks. Chunks
//! carry no header: the transport's message boundaries are the framing, and
//! concatenating the chunks of one reply gives back the full text.
//!
//! # Reply Format
//!
//! ```text
//! code: <status>
//! <message>
//! ```
//!
//! The second line is omitted when the message is empty.
//!
//! # Example
//!
//! ```
//! use ble_wifi_console::console::{Reply, ResponseFramer};
//!
//! let framer = ResponseFramer::default();
//! let chunks = framer.frame(&Reply::new(0, ""));
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].as_bytes(), b"code: 0");
//! ```

use std::fmt;

/// Default maximum chunk size in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Smallest chunk size that always fits one UTF-8 character.
pub const MIN_CHUNK_SIZE: usize = 4;

/// Status code and message produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: i32,
    pub message: String,
}

impl Reply {
    /// Create a reply.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Render the full reply text.
    pub fn to_wire(&self) -> String {
        if self.message.is_empty() {
            format!("code: {}", self.code)
        } else {
            format!("code: {}\n{}", self.code, self.message)
        }
    }
}

/// One outbound notification payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseChunk(Vec<u8>);

impl ResponseChunk {
    /// Raw chunk bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Chunk length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the chunk is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the chunk, returning its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

/// Errors when configuring the framer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Chunk size cannot hold a full UTF-8 character.
    ChunkSizeTooSmall(usize),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChunkSizeTooSmall(size) => write!(
                f,
                "chunk size {} too small (minimum: {})",
                size, MIN_CHUNK_SIZE
            ),
        }
    }
}

impl std::error::Error for FrameError {}

/// Splits replies into transport-sized chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseFramer {
    /// Maximum chunk size in bytes.
    max_chunk: usize,
}

impl ResponseFramer {
    /// Create a framer with the given maximum chunk size.
    ///
    /// Returns `Err(FrameError::ChunkSizeTooSmall)` below [`MIN_CHUNK_SIZE`].
    pub fn try_new(max_chunk: usize) -> Result<Self, FrameError> {
        if max_chunk < MIN_CHUNK_SIZE {
            return Err(FrameError::ChunkSizeTooSmall(max_chunk));
        }
        Ok(Self { max_chunk })
    }

    /// Maximum chunk size in bytes.
    pub fn max_chunk(&self) -> usize {
        self.max_chunk
    }

    /// Render a reply and split it into chunks.
    ///
    /// Always yields at least one chunk. No chunk ends in the middle of a
    /// UTF-8 character, so a chunk may be shorter than the maximum when a
    /// multi-byte character straddles the limit.
    pub fn frame(&self, reply: &Reply) -> Vec<ResponseChunk> {
        let text = reply.to_wire();
        let mut chunks = Vec::with_capacity(text.len().div_ceil(self.max_chunk));
        let mut rest = text.as_str();

        while !rest.is_empty() {
            let mut end = rest.len().min(self.max_chunk);
            while !rest.is_char_boundary(end) {
                end -= 1;
            }
            let (head, tail) = rest.split_at(end);
            chunks.push(ResponseChunk(head.as_bytes().to_vec()));
            rest = tail;
        }

        chunks
    }
}

impl Default for ResponseFramer {
    fn default() -> Self {
        Self {
            max_chunk: DEFAULT_CHUNK_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(chunks: &[ResponseChunk]) -> Vec<u8> {
        chunks.iter().flat_map(|c| c.as_bytes().to_vec()).collect()
    }

    #[test]
    fn test_empty_message_single_chunk() {
        let chunks = ResponseFramer::default().frame(&Reply::new(0, ""));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].as_bytes(), b"code: 0");
    }

    #[test]
    fn test_message_after_newline() {
        let chunks = ResponseFramer::default().frame(&Reply::new(1, "unknown command"));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].as_bytes(), b"code: 1\nunknown command");
    }

    #[test]
    fn test_negative_code() {
        assert_eq!(Reply::new(-1, "").to_wire(), "code: -1");
    }

    #[test]
    fn test_long_message_split() {
        let message = "x".repeat(1200);
        let chunks = ResponseFramer::default().frame(&Reply::new(1, message.clone()));

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 500);
        assert_eq!(chunks[1].len(), 500);
        assert_eq!(chunks[2].len(), 1208 - 1000);
        assert_eq!(joined(&chunks), format!("code: 1\n{}", message).into_bytes());
    }

    #[test]
    fn test_exact_fit() {
        // "code: 0\n" is 8 bytes
        let chunks = ResponseFramer::default().frame(&Reply::new(0, "y".repeat(992)));
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len() == 500));
    }

    #[test]
    fn test_multibyte_not_split() {
        let framer = ResponseFramer::try_new(10).unwrap();
        // "code: 0\n" is 8 bytes, then a 3-byte character would straddle 10
        let reply = Reply::new(0, "€€€");
        let chunks = framer.frame(&reply);

        assert_eq!(chunks[0].as_bytes(), b"code: 0\n");
        for chunk in &chunks {
            assert!(chunk.len() <= 10);
            assert!(std::str::from_utf8(chunk.as_bytes()).is_ok());
        }
        assert_eq!(joined(&chunks), reply.to_wire().into_bytes());
    }

    #[test]
    fn test_four_byte_characters_at_minimum_size() {
        let framer = ResponseFramer::try_new(MIN_CHUNK_SIZE).unwrap();
        let reply = Reply::new(0, "🦀🦀");
        let chunks = framer.frame(&reply);
        assert_eq!(joined(&chunks), reply.to_wire().into_bytes());
        assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= MIN_CHUNK_SIZE));
    }

    #[test]
    fn test_chunk_size_too_small() {
        assert_eq!(
            ResponseFramer::try_new(3),
            Err(FrameError::ChunkSizeTooSmall(3))
        );
        assert!(ResponseFramer::try_new(4).is_ok());
    }
}
