//! Console configuration.
//!
//! Defaults suit a Raspberry Pi style host running NetworkManager. Each
//! setting can be overridden from the environment:
//!
//! | Variable                  | Default     | Meaning                             |
//! |---------------------------|-------------|-------------------------------------|
//! | `BLE_CONSOLE_CHUNK_SIZE`  | `500`       | Max bytes per outbound notification |
//! | `BLE_CONSOLE_NMCLI`       | `nmcli`     | NetworkManager CLI executable       |
//! | `BLE_CONSOLE_IP`          | `ip`        | iproute2 executable                 |
//! | `BLE_CONSOLE_PRIVILEGE`   | `sudo -n`   | Prefix for reboot/poweroff (may be empty) |
//! | `BLE_CONSOLE_STATS_PORT`  | unset       | Serve `/stats` on this port         |

use crate::console::framing::{DEFAULT_CHUNK_SIZE, MIN_CHUNK_SIZE};
use std::fmt;

pub const ENV_CHUNK_SIZE: &str = "BLE_CONSOLE_CHUNK_SIZE";
pub const ENV_NMCLI: &str = "BLE_CONSOLE_NMCLI";
pub const ENV_IP: &str = "BLE_CONSOLE_IP";
pub const ENV_PRIVILEGE: &str = "BLE_CONSOLE_PRIVILEGE";
pub const ENV_STATS_PORT: &str = "BLE_CONSOLE_STATS_PORT";

/// Runtime settings for the console server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Maximum bytes per outbound chunk.
    pub chunk_size: usize,
    /// NetworkManager CLI executable.
    pub nmcli_program: String,
    /// iproute2 `ip` executable.
    pub ip_program: String,
    /// Command prefix for privileged operations, e.g. `["sudo", "-n"]`.
    pub privilege_command: Vec<String>,
    /// Port for the HTTP stats endpoint, if enabled.
    pub stats_port: Option<u16>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            nmcli_program: "nmcli".to_string(),
            ip_program: "ip".to_string(),
            privilege_command: vec!["sudo".to_string(), "-n".to_string()],
            stats_port: None,
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration using `lookup` to read variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_CHUNK_SIZE) {
            let size = parse_number::<usize>(ENV_CHUNK_SIZE, &value)?;
            if size < MIN_CHUNK_SIZE {
                return Err(ConfigError::ChunkSizeTooSmall {
                    size,
                    min: MIN_CHUNK_SIZE,
                });
            }
            config.chunk_size = size;
        }
        if let Some(value) = lookup(ENV_NMCLI) {
            config.nmcli_program = non_empty(ENV_NMCLI, value)?;
        }
        if let Some(value) = lookup(ENV_IP) {
            config.ip_program = non_empty(ENV_IP, value)?;
        }
        if let Some(value) = lookup(ENV_PRIVILEGE) {
            config.privilege_command = value.split_whitespace().map(str::to_string).collect();
        }
        if let Some(value) = lookup(ENV_STATS_PORT) {
            config.stats_port = Some(parse_number::<u16>(ENV_STATS_PORT, &value)?);
        }

        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn non_empty(key: &'static str, value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Empty(key));
    }
    Ok(trimmed.to_string())
}

/// Errors in configuration values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Value could not be parsed.
    InvalidValue { key: &'static str, value: String },
    /// Chunk size below the minimum.
    ChunkSizeTooSmall { size: usize, min: usize },
    /// A required value is empty.
    Empty(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { key, value } => write!(f, "invalid {}: {:?}", key, value),
            Self::ChunkSizeTooSmall { size, min } => {
                write!(f, "chunk size too small: {} bytes (min {})", size, min)
            }
            Self::Empty(key) => write!(f, "{} cannot be empty", key),
        }
    }
}

impl std::error::Error for ConfigError {}
