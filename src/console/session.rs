//! Per-connection console state.

use crate::wifi::NetworkCandidate;

/// State kept for one remote connection.
///
/// Holds the networks from the last successful `list` so `conn` can refer to
/// them by index. Created when the peer connects and dropped when it leaves.
#[derive(Debug, Default, Clone)]
pub struct Session {
    candidates: Vec<NetworkCandidate>,
}

impl Session {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the remembered networks.
    ///
    /// Indices are reassigned as `0..N-1` in the given order.
    pub fn replace_candidates(&mut self, mut candidates: Vec<NetworkCandidate>) {
        for (index, candidate) in candidates.iter_mut().enumerate() {
            candidate.index = index;
        }
        self.candidates = candidates;
    }

    /// Networks from the last `list`.
    pub fn candidates(&self) -> &[NetworkCandidate] {
        &self.candidates
    }

    /// Resolve a `conn` target to a remembered network.
    ///
    /// Only a non-negative integer inside the current list resolves;
    /// anything else is meant to be used as a literal SSID.
    pub fn resolve(&self, target: &str) -> Option<&NetworkCandidate> {
        target
            .parse::<usize>()
            .ok()
            .and_then(|idx| self.candidates.get(idx))
    }
}
