//! Interface address listing from `ip -j addr`.

use super::StructuredOutputError;
use serde::Deserialize;

/// Operational state reported for an interface that is up.
const OPERSTATE_UP: &str = "UP";

/// One interface entry from `ip -j addr`.
///
/// Only the fields the console reports are declared; the rest are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Interface {
    pub ifname: String,
    pub operstate: String,
    pub addr_info: Vec<AddrInfo>,
}

/// One address assigned to an interface.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddrInfo {
    pub local: String,
}

impl Interface {
    /// Check if the interface is up and has at least one address.
    pub fn is_reportable(&self) -> bool {
        self.operstate == OPERSTATE_UP && !self.addr_info.is_empty()
    }
}

/// Build the `ip -j addr` invocation for the given `ip` executable.
pub fn ip_addr_argv(program: &str) -> Vec<String> {
    vec![program.to_string(), "-j".to_string(), "addr".to_string()]
}

/// Parse `ip -j addr` JSON output.
///
/// Any interface missing `ifname`, `operstate` or `addr_info[].local`
/// fails the whole parse.
pub fn parse_interfaces(output: &str) -> Result<Vec<Interface>, StructuredOutputError> {
    serde_json::from_str(output).map_err(|e| StructuredOutputError::InvalidJson(e.to_string()))
}

/// Render one `"{ifname} {addr,addr}"` line per reportable interface.
pub fn format_addresses(interfaces: &[Interface]) -> String {
    interfaces
        .iter()
        .filter(|iface| iface.is_reportable())
        .map(|iface| {
            let locals: Vec<&str> = iface.addr_info.iter().map(|a| a.local.as_str()).collect();
            format!("{} {}", iface.ifname, locals.join(","))
        })
        .collect::<Vec<_>>()
        .join("\n")
}
