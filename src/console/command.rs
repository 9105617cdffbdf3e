//! Console command table.
//!
//! Every command the console understands is a variant of [`CommandKind`].
//! Names are matched case-insensitively and each command may have a short
//! alias.

use std::fmt;

/// Commands accepted on the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Show usage text.
    Help,
    /// Trigger a WiFi rescan.
    Scan,
    /// List visible networks and remember them for `conn`.
    List,
    /// Connect to a network by list index or SSID.
    Connect,
    /// Show addresses of interfaces that are up.
    Address,
    /// Turn the WiFi radio on.
    RadioOn,
    /// Turn the WiFi radio off.
    RadioOff,
    /// Reboot the device.
    Reboot,
    /// Power the device off.
    PowerOff,
}

impl CommandKind {
    /// All commands, in help order.
    pub const ALL: [CommandKind; 9] = [
        Self::Help,
        Self::Scan,
        Self::List,
        Self::Connect,
        Self::Address,
        Self::RadioOn,
        Self::RadioOff,
        Self::Reboot,
        Self::PowerOff,
    ];

    /// Resolve a command name or alias, ignoring case.
    ///
    /// Returns `None` for names that are not in the table.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "help" | "h" => Some(Self::Help),
            "scan" | "s" => Some(Self::Scan),
            "list" | "l" => Some(Self::List),
            "conn" | "c" => Some(Self::Connect),
            "addr" | "a" => Some(Self::Address),
            "on" => Some(Self::RadioOn),
            "off" => Some(Self::RadioOff),
            "reboot" | "r" => Some(Self::Reboot),
            "poweroff" | "p" => Some(Self::PowerOff),
            _ => None,
        }
    }

    /// Canonical command name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Scan => "scan",
            Self::List => "list",
            Self::Connect => "conn",
            Self::Address => "addr",
            Self::RadioOn => "on",
            Self::RadioOff => "off",
            Self::Reboot => "reboot",
            Self::PowerOff => "poweroff",
        }
    }

    /// Short alias, if the command has one.
    pub fn alias(&self) -> Option<&'static str> {
        match self {
            Self::Help => Some("h"),
            Self::Scan => Some("s"),
            Self::List => Some("l"),
            Self::Connect => Some("c"),
            Self::Address => Some("a"),
            Self::RadioOn | Self::RadioOff => None,
            Self::Reboot => Some("r"),
            Self::PowerOff => Some("p"),
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Usage text returned by `help`.
pub const HELP_TEXT: &str = "\
help: show this help
scan: start background wifi scan
list: list available networks
conn <ssid|index> [<passwd>]: connect to a network
addr: show interface addresses
on: turn wifi radio on
off: turn wifi radio off
reboot: reboot the device
poweroff: power the device off
shortcuts: h=help s=scan l=list c=conn a=addr r=reboot p=poweroff";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_and_aliases() {
        for kind in CommandKind::ALL {
            assert_eq!(CommandKind::from_name(kind.as_str()), Some(kind));
            if let Some(alias) = kind.alias() {
                assert_eq!(CommandKind::from_name(alias), Some(kind));
            }
        }
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(CommandKind::from_name("LIST"), Some(CommandKind::List));
        assert_eq!(CommandKind::from_name("Conn"), Some(CommandKind::Connect));
        assert_eq!(CommandKind::from_name("P"), Some(CommandKind::PowerOff));
    }

    #[test]
    fn test_unknown() {
        assert_eq!(CommandKind::from_name("connect"), None);
        assert_eq!(CommandKind::from_name("ls"), None);
        assert_eq!(CommandKind::from_name(""), None);
    }

    #[test]
    fn test_help_mentions_every_command() {
        for kind in CommandKind::ALL {
            assert!(HELP_TEXT.contains(kind.as_str()), "missing {}", kind);
        }
    }
}
