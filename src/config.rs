//! # Configuration Management
//!
//! Centralized configuration for the RCON client.
//!
//! This module provides structured configuration for the connection (target,
//! local bind address, frame limit, body encoding, timeouts) and for logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment-specific overrides via `from_env()`
//!
//! ## Defaults
//! - Target `127.0.0.1:27015`, the conventional RCON port
//! - No frame limit (`max_packet_size = 0`)
//! - ASCII bodies
//! - 5 second connect/write and authentication timeouts

use crate::core::encoding::TextEncoding;
use crate::error::{ProtocolError, Result};
use crate::utils::timeout;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use tracing::Level;

/// Default RCON host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Well-known RCON port
pub const DEFAULT_PORT: u16 = 27015;

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RconConfig {
    /// Connection configuration
    #[serde(default)]
    pub client: ClientConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RconConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("RCON_HOST") {
            config.client.host = host;
        }

        if let Ok(port) = std::env::var("RCON_PORT") {
            config.client.port = port
                .parse()
                .map_err(|e| ProtocolError::ConfigError(format!("Invalid RCON_PORT: {e}")))?;
        }

        if let Ok(local) = std::env::var("RCON_LOCAL_ADDRESS") {
            config.client.local_address = Some(local);
        }

        if let Ok(size) = std::env::var("RCON_MAX_PACKET_SIZE") {
            if let Ok(val) = size.parse::<usize>() {
                config.client.max_packet_size = val;
            }
        }

        if let Ok(encoding) = std::env::var("RCON_ENCODING") {
            config.client.encoding = encoding.parse()?;
        }

        if let Ok(timeout) = std::env::var("RCON_TIMEOUT_MS") {
            if let Ok(val) = timeout.parse::<u64>() {
                config.client.timeout = Duration::from_millis(val);
            }
        }

        if let Ok(timeout) = std::env::var("RCON_AUTH_TIMEOUT_MS") {
            if let Ok(val) = timeout.parse::<u64>() {
                config.client.auth_timeout = Duration::from_millis(val);
            }
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.client.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Connection configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server host name or IP address
    pub host: String,

    /// Server port
    pub port: u16,

    /// Local address to bind before connecting (e.g. "0.0.0.0:0")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_address: Option<String>,

    /// Largest frame, in bytes, sent or accepted; 0 disables the check
    pub max_packet_size: usize,

    /// Character encoding of packet bodies
    pub encoding: TextEncoding,

    /// Bound on connecting and on each socket write
    #[serde(with = "duration_serde")]
    pub timeout: Duration,

    /// How long to wait for an AUTH_RESPONSE
    #[serde(with = "duration_serde")]
    pub auth_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: String::from(DEFAULT_HOST),
            port: DEFAULT_PORT,
            local_address: None,
            max_packet_size: 0,
            encoding: TextEncoding::Ascii,
            timeout: timeout::DEFAULT_TIMEOUT,
            auth_timeout: timeout::AUTH_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Build a config for `host:port` with every other field defaulted
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// `host:port` string for connecting
    pub fn address(&self) -> String {
        match self.host.parse::<IpAddr>() {
            Ok(IpAddr::V6(ip)) => format!("[{ip}]:{}", self.port),
            _ => format!("{}:{}", self.host, self.port),
        }
    }

    /// Parsed local bind address, if one is configured
    pub fn local_socket_addr(&self) -> Result<Option<SocketAddr>> {
        self.local_address
            .as_deref()
            .map(|addr| {
                addr.parse::<SocketAddr>()
                    .or_else(|_| addr.parse::<IpAddr>().map(|ip| SocketAddr::new(ip, 0)))
                    .map_err(|_| {
                        ProtocolError::ConfigError(format!("Invalid local address: '{addr}'"))
                    })
            })
            .transpose()
    }

    /// Validate client configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.host.trim().is_empty() {
            errors.push("Host cannot be empty".to_string());
        }

        if self.port == 0 {
            errors.push("Port must be greater than 0".to_string());
        }

        if let Err(e) = self.local_socket_addr() {
            errors.push(e.to_string());
        }

        // A frame with an empty body is already 14 bytes
        if self.max_packet_size != 0 && self.max_packet_size < crate::core::packet::FRAME_OVERHEAD {
            errors.push(format!(
                "Max packet size too small: {} (minimum: {} or 0 for unbounded)",
                self.max_packet_size,
                crate::core::packet::FRAME_OVERHEAD
            ));
        }

        if self.timeout.as_millis() < 10 {
            errors.push("Timeout too short (minimum: 10ms)".to_string());
        } else if self.timeout.as_secs() > 300 {
            errors.push("Timeout too long (maximum: 300s)".to_string());
        }

        if self.auth_timeout.as_millis() < 10 {
            errors.push("Auth timeout too short (minimum: 10ms)".to_string());
        } else if self.auth_timeout.as_secs() > 300 {
            errors.push("Auth timeout too long (maximum: 300s)".to_string());
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("rcon-protocol"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for Duration serialization/deserialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        level.as_str().to_ascii_lowercase().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
