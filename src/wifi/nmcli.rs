//! NetworkManager CLI integration.
//!
//! Builds `nmcli` argument vectors and parses its multiline output.
//!
//! # Multiline Format
//!
//! `nmcli -m multiline` prints one `KEY: value` pair per line. A record ends
//! when a key repeats:
//!
//! ```text
//! BSSID:                                  AA:BB:CC:DD:EE:01
//! SSID:                                   HomeNet
//! SECURITY:                               WPA2
//! SIGNAL:                                 72
//! IN-USE:                                 *
//! CHAN:                                   6
//! BSSID:                                  AA:BB:CC:DD:EE:02
//! ...
//! ```

use super::{NetworkCandidate, StructuredOutputError};
use zeroize::Zeroizing;

/// Fields requested from `nmcli device wifi list`.
pub const LIST_FIELDS: &str = "BSSID,SSID,SECURITY,SIGNAL,IN-USE,CHAN";

/// Header line printed above the network table.
pub const LIST_HEADER: &str = "SSID (BSSID) SECURITY SIGNAL (CHANNEL)";

/// Value of the `IN-USE` field for the active network.
const IN_USE_MARKER: &str = "*";

/// One `KEY: value` record, in the order keys appeared.
pub type Record = Vec<(String, String)>;

/// Builds `nmcli` invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nmcli {
    program: String,
}

impl Nmcli {
    /// Create a builder for the given `nmcli` executable.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn argv(&self, args: &[&str]) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(args.iter().map(|a| a.to_string()))
            .collect()
    }

    /// `nmcli device wifi rescan`
    pub fn rescan(&self) -> Vec<String> {
        self.argv(&["device", "wifi", "rescan"])
    }

    /// `nmcli -m multiline -f <fields> device wifi list`
    pub fn list(&self) -> Vec<String> {
        self.argv(&["-m", "multiline", "-f", LIST_FIELDS, "device", "wifi", "list"])
    }

    /// `nmcli device wifi connect <target> [password <password>]`
    ///
    /// The returned vector is zeroized on drop since it may hold a password.
    pub fn connect(&self, target: &str, password: Option<&str>) -> Zeroizing<Vec<String>> {
        let mut argv = self.argv(&["device", "wifi", "connect", target]);
        if let Some(password) = password {
            argv.push("password".to_string());
            argv.push(password.to_string());
        }
        Zeroizing::new(argv)
    }

    /// `nmcli radio wifi on|off`
    pub fn radio(&self, on: bool) -> Vec<String> {
        self.argv(&["radio", "wifi", if on { "on" } else { "off" }])
    }
}

impl Default for Nmcli {
    fn default() -> Self {
        Self::new("nmcli")
    }
}

/// Split multiline output into records.
///
/// Lines without a `:` are ignored. Keys and values are trimmed.
pub fn parse_multiline(output: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut current: Record = Vec::new();

    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if current.iter().any(|(k, _)| k == key) {
            records.push(std::mem::take(&mut current));
        }
        current.push((key.to_string(), value.trim().to_string()));
    }

    if !current.is_empty() {
        records.push(current);
    }
    records
}

fn field<'a>(
    record: &'a Record,
    index: usize,
    name: &'static str,
) -> Result<&'a str, StructuredOutputError> {
    record
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
        .ok_or(StructuredOutputError::MissingField {
            record: index,
            field: name,
        })
}

/// Parse `nmcli device wifi list` output into indexed candidates.
///
/// Indices follow the order networks were listed. Fails if any record lacks
/// a requested field or has a non-numeric signal.
pub fn parse_network_list(output: &str) -> Result<Vec<NetworkCandidate>, StructuredOutputError> {
    parse_multiline(output)
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let signal = field(record, index, "SIGNAL")?;
            let signal = signal
                .parse::<i32>()
                .map_err(|_| StructuredOutputError::InvalidNumber {
                    record: index,
                    field: "SIGNAL",
                    value: signal.to_string(),
                })?;
            Ok(NetworkCandidate {
                index,
                ssid: field(record, index, "SSID")?.to_string(),
                bssid: field(record, index, "BSSID")?.to_string(),
                security: field(record, index, "SECURITY")?.to_string(),
                signal,
                in_use: field(record, index, "IN-USE")? == IN_USE_MARKER,
                channel: field(record, index, "CHAN")?.to_string(),
            })
        })
        .collect()
}

/// Render candidates as the table returned by `list`.
pub fn format_network_table(candidates: &[NetworkCandidate]) -> String {
    let mut output = String::from(LIST_HEADER);
    for candidate in candidates {
        output.push('\n');
        output.push_str(&candidate.to_string());
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_NETWORKS: &str = "\
BSSID:                                  AA:BB:CC:DD:EE:01
SSID:                                   HomeNet
SECURITY:                               WPA2
SIGNAL:                                 72
IN-USE:                                 *
CHAN:                                   6
BSSID:                                  AA:BB:CC:DD:EE:02
SSID:                                   Cafe Guest
SECURITY:                               --
SIGNAL:                                 40
IN-USE:
CHAN:                                   11
";

    #[test]
    fn test_parse_multiline_splits_on_repeated_key() {
        let records = parse_multiline(TWO_NETWORKS);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0][0], ("BSSID".to_string(), "AA:BB:CC:DD:EE:01".to_string()));
        assert_eq!(records[1][1], ("SSID".to_string(), "Cafe Guest".to_string()));
        assert_eq!(records[1][4], ("IN-USE".to_string(), String::new()));
    }

    #[test]
    fn test_parse_multiline_ignores_noise() {
        let records = parse_multiline("\n  \nno separator here\nA: 1\n");
        assert_eq!(records, vec![vec![("A".to_string(), "1".to_string())]]);
        assert!(parse_multiline("").is_empty());
    }

    #[test]
    fn test_parse_network_list() {
        let candidates = parse_network_list(TWO_NETWORKS).unwrap();
        assert_eq!(candidates.len(), 2);

        assert_eq!(candidates[0].index, 0);
        assert_eq!(candidates[0].ssid, "HomeNet");
        assert_eq!(candidates[0].bssid, "AA:BB:CC:DD:EE:01");
        assert_eq!(candidates[0].signal, 72);
        assert!(candidates[0].in_use);
        assert_eq!(candidates[0].channel, "6");

        assert_eq!(candidates[1].index, 1);
        assert_eq!(candidates[1].security, "--");
        assert!(!candidates[1].in_use);
    }

    #[test]
    fn test_parse_network_list_missing_field() {
        let output = "BSSID: AA:BB:CC:DD:EE:01\nSSID: x\nSIGNAL: 5\n";
        assert!(matches!(
            parse_network_list(output),
            Err(StructuredOutputError::MissingField { record: 0, .. })
        ));
    }

    #[test]
    fn test_parse_network_list_bad_signal() {
        let output = TWO_NETWORKS.replace(" 40\n", " strong\n");
        assert!(matches!(
            parse_network_list(&output),
            Err(StructuredOutputError::InvalidNumber { record: 1, field: "SIGNAL", .. })
        ));
    }

    #[test]
    fn test_format_network_table() {
        let candidates = parse_network_list(TWO_NETWORKS).unwrap();
        assert_eq!(
            format_network_table(&candidates),
            "SSID (BSSID) SECURITY SIGNAL (CHANNEL)\n\
             0) *HomeNet (AA:BB:CC:DD:EE:01) WPA2 72 (6)\n\
             1) Cafe Guest (AA:BB:CC:DD:EE:02) -- 40 (11)"
        );
        assert_eq!(format_network_table(&[]), LIST_HEADER);
    }

    #[test]
    fn test_argv_builders() {
        let nmcli = Nmcli::default();
        assert_eq!(nmcli.rescan(), vec!["nmcli", "device", "wifi", "rescan"]);
        assert_eq!(
            nmcli.list(),
            vec!["nmcli", "-m", "multiline", "-f", LIST_FIELDS, "device", "wifi", "list"]
        );
        assert_eq!(nmcli.radio(false), vec!["nmcli", "radio", "wifi", "off"]);
        assert_eq!(
            *nmcli.connect("HomeNet", Some("hunter22")),
            vec!["nmcli", "device", "wifi", "connect", "HomeNet", "password", "hunter22"]
        );
        assert_eq!(
            *Nmcli::new("/usr/bin/nmcli").connect("Open", None),
            vec!["/usr/bin/nmcli", "device", "wifi", "connect", "Open"]
        );
    }
}
