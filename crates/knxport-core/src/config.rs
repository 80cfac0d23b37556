//! Adapter configuration stored as JSON
//!
//! Every field has a default, so an empty object `{}` is a valid file.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::driver::{DriverConfig, DEFAULT_ITERATIONS};
use crate::protocol::{
    default_naming, ParityMode, PrefixNaming, TransportConfig, DEFAULT_BAUD_RATE,
    DEFAULT_POLL_TIMEOUT_MS,
};
use crate::timer::{StackType, DEFAULT_TICK_MS};

/// Errors that can occur while loading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Adapter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Serial port number
    pub port: u32,

    /// Baud rate
    pub baud_rate: u32,

    /// Line parity
    pub parity: ParityMode,

    /// Wait window of one polling step in milliseconds
    pub poll_timeout_ms: u64,

    /// Device path prefix; the platform default when absent
    pub device_prefix: Option<String>,

    /// Discard pending output on flush
    pub flush_transmitter: bool,

    /// Stack variant, decides whether the connection timeout is armed
    pub stack: StackType,

    /// System tick period in milliseconds
    pub tick_ms: u64,

    /// Polling steps per session
    pub iterations: u32,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            port: 0,
            baud_rate: DEFAULT_BAUD_RATE,
            parity: ParityMode::default(),
            poll_timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
            device_prefix: None,
            flush_transmitter: true,
            stack: StackType::default(),
            tick_ms: DEFAULT_TICK_MS,
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl AdapterConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Save configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Settings for the serial transport
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            baud_rate: self.baud_rate,
            parity: self.parity,
            poll_timeout: Duration::from_millis(self.poll_timeout_ms),
            flush_transmitter: self.flush_transmitter,
        }
    }

    /// Settings for the driver loop
    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            iterations: self.iterations,
            ..DriverConfig::default()
        }
    }

    /// Device naming, honouring `device_prefix`
    pub fn naming(&self) -> PrefixNaming {
        match &self.device_prefix {
            Some(prefix) => PrefixNaming::new(prefix.clone()),
            None => default_naming(),
        }
    }

    /// System tick period
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}
