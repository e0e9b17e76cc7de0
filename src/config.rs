//! Configuration for the distox-io tool
//!
//! Loads configuration from a TOML file. Everything has a sensible
//! default, so the tool also runs from command-line flags alone.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub port: PortConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial port configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PortConfig {
    /// Serial device the DistoX RFCOMM channel is bound to
    /// (e.g. `/dev/rfcomm0`)
    pub path: String,

    /// Advertised bluetooth device name, used to classify the hardware
    /// generation (`DistoX` or `DistoX-<serial>`)
    #[serde(default = "default_device_name")]
    pub device_name: String,

    /// Baud rate. RFCOMM ttys ignore this, but the serial API requires it.
    #[serde(default = "default_baud")]
    pub baud: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

fn default_device_name() -> String {
    "DistoX".to_string()
}

fn default_baud() -> u32 {
    9600
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Default configuration: original DistoX on `/dev/rfcomm0`
    pub fn defaults() -> Self {
        Config {
            port: PortConfig {
                path: "/dev/rfcomm0".to_string(),
                device_name: default_device_name(),
                baud: default_baud(),
            },
            logging: LoggingConfig::default(),
        }
    }
}
