//! Console statistics.
//!
//! Counters are updated by the server and connection workers and can be
//! served as JSON by the optional HTTP endpoint in [`http`].
//!
//! # Example Response
//!
//! ```json
//! {
//!   "uptime_secs": 3600,
//!   "connections": { "active": 1, "total": 4 },
//!   "commands": { "handled": 12, "ok": 10, "failed": 2, "parse_errors": 1, "dropped": 0 },
//!   "chunks": { "sent": 20, "dropped": 3, "send_failures": 0 },
//!   "faults": 0
//! }
//! ```

#[cfg(feature = "stats-server")]
mod http;

#[cfg(feature = "stats-server")]
pub use http::StatsServer;

use crate::console::EmitOutcome;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Shared counters for one running console.
///
/// All fields are atomics so workers can update them without locking.
#[derive(Debug)]
pub struct ConsoleStats {
    start_time: Instant,
    pub active_connections: AtomicUsize,
    pub total_connections: AtomicUsize,
    pub commands_handled: AtomicUsize,
    pub replies_ok: AtomicUsize,
    pub replies_failed: AtomicUsize,
    pub parse_errors: AtomicUsize,
    /// Lines or subscription changes discarded because a peer's inbox was full.
    pub inputs_dropped: AtomicUsize,
    pub chunks_sent: AtomicUsize,
    pub chunks_dropped: AtomicUsize,
    pub send_failures: AtomicUsize,
    pub faults: AtomicUsize,
}

#[derive(Serialize)]
struct ConnectionSnapshot {
    active: usize,
    total: usize,
}

#[derive(Serialize)]
struct CommandSnapshot {
    handled: usize,
    ok: usize,
    failed: usize,
    parse_errors: usize,
    dropped: usize,
}

#[derive(Serialize)]
struct ChunkSnapshot {
    sent: usize,
    dropped: usize,
    send_failures: usize,
}

#[derive(Serialize)]
struct Snapshot {
    uptime_secs: u64,
    connections: ConnectionSnapshot,
    commands: CommandSnapshot,
    chunks: ChunkSnapshot,
    faults: usize,
}

fn load(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::Relaxed)
}

fn bump(counter: &AtomicUsize, by: usize) {
    counter.fetch_add(by, Ordering::Relaxed);
}

impl ConsoleStats {
    /// Create zeroed statistics.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            active_connections: AtomicUsize::new(0),
            total_connections: AtomicUsize::new(0),
            commands_handled: AtomicUsize::new(0),
            replies_ok: AtomicUsize::new(0),
            replies_failed: AtomicUsize::new(0),
            parse_errors: AtomicUsize::new(0),
            inputs_dropped: AtomicUsize::new(0),
            chunks_sent: AtomicUsize::new(0),
            chunks_dropped: AtomicUsize::new(0),
            send_failures: AtomicUsize::new(0),
            faults: AtomicUsize::new(0),
        }
    }

    /// Get uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn record_connect(&self) {
        bump(&self.active_connections, 1);
        bump(&self.total_connections, 1);
    }

    pub fn record_disconnect(&self) {
        // Saturating: a disconnect may arrive for a peer that never connected
        let _ = self
            .active_connections
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn record_parse_error(&self) {
        bump(&self.parse_errors, 1);
    }

    pub fn record_input_dropped(&self) {
        bump(&self.inputs_dropped, 1);
    }

    /// Record a dispatched command and its reply status.
    pub fn record_reply(&self, code: i32) {
        bump(&self.commands_handled, 1);
        if code == 0 {
            bump(&self.replies_ok, 1);
        } else {
            bump(&self.replies_failed, 1);
        }
    }

    /// Record what the transmit gate did with a reply.
    pub fn record_emit(&self, outcome: &EmitOutcome) {
        match outcome {
            EmitOutcome::Sent(n) => bump(&self.chunks_sent, *n),
            EmitOutcome::Dropped(n) => bump(&self.chunks_dropped, *n),
            EmitOutcome::Failed {
                sent, abandoned, ..
            } => {
                bump(&self.chunks_sent, *sent);
                bump(&self.chunks_dropped, *abandoned);
                bump(&self.send_failures, 1);
            }
        }
    }

    pub fn record_fault(&self) {
        bump(&self.faults, 1);
    }

    /// Serialize all statistics to JSON.
    pub fn to_json(&self) -> String {
        let snapshot = Snapshot {
            uptime_secs: self.uptime_secs(),
            connections: ConnectionSnapshot {
                active: load(&self.active_connections),
                total: load(&self.total_connections),
            },
            commands: CommandSnapshot {
                handled: load(&self.commands_handled),
                ok: load(&self.replies_ok),
                failed: load(&self.replies_failed),
                parse_errors: load(&self.parse_errors),
                dropped: load(&self.inputs_dropped),
            },
            chunks: ChunkSnapshot {
                sent: load(&self.chunks_sent),
                dropped: load(&self.chunks_dropped),
                send_failures: load(&self.send_failures),
            },
            faults: load(&self.faults),
        };
        // Plain structs of integers always serialize
        serde_json::to_string(&snapshot).unwrap_or_default()
    }
}

impl Default for ConsoleStats {
    fn default() -> Self {
        Self::new()
    }
}
