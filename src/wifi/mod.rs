//! WiFi and interface tooling.
//!
//! This module knows the command lines of the external network tools and
//! how to read their structured output. It never runs anything itself; the
//! [`crate::executor`] does that.
//!
//! # Components
//!
//! - [`nmcli`] - NetworkManager CLI invocations and multiline parsing
//! - [`addr`] - `ip -j addr` parsing

pub mod addr;
pub mod nmcli;

use std::fmt;

pub use addr::{format_addresses, parse_interfaces, Interface};
pub use nmcli::{format_network_table, parse_network_list, Nmcli};

/// A network seen by the most recent `list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkCandidate {
    /// Position in the listing, starting at 0.
    pub index: usize,
    /// Network name, possibly empty for hidden networks.
    pub ssid: String,
    /// Access point hardware address, e.g. `AA:BB:CC:DD:EE:01`.
    pub bssid: String,
    /// Security protocols, e.g. `WPA2` or empty for open networks.
    pub security: String,
    /// Signal strength as reported by nmcli (0-100).
    pub signal: i32,
    /// Whether this is the currently connected network.
    pub in_use: bool,
    /// Radio channel number.
    pub channel: String,
}

impl fmt::Display for NetworkCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}) {}{} ({}) {} {} ({})",
            self.index,
            if self.in_use { "*" } else { "" },
            self.ssid,
            self.bssid,
            self.security,
            self.signal,
            self.channel
        )
    }
}

/// Structured tool output that could not be understood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredOutputError {
    /// A record lacks a required field.
    MissingField { record: usize, field: &'static str },
    /// A numeric field holds something else.
    InvalidNumber {
        record: usize,
        field: &'static str,
        value: String,
    },
    /// JSON output did not match the expected shape.
    InvalidJson(String),
}

impl fmt::Display for StructuredOutputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { record, field } => {
                write!(f, "record {} has no {} field", record, field)
            }
            Self::InvalidNumber {
                record,
                field,
                value,
            } => write!(f, "record {}: {} is not a number: {:?}", record, field, value),
            Self::InvalidJson(msg) => write!(f, "invalid JSON: {}", msg),
        }
    }
}

impl std::error::Error for StructuredOutputError {}
