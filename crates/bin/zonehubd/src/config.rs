//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `zonehub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::fmt;

use serde::Deserialize;
use zonehub_adapter_virtual::VirtualConfig;
use zonehub_domain::id::{DeviceId, ZoneId};
use zonehub_domain::limits::{
    DEFAULT_ADDR, DEFAULT_BAUDRATE, DEFAULT_BYTESIZE, DEFAULT_STOPBITS, DEFAULT_TIMEOUT_SECS,
};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How the controller presents itself.
    pub device: DeviceConfig,
    /// Serial line settings.
    pub serial: SerialConfig,
    /// Controller loop settings.
    pub controller: ControllerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Simulated controller contents.
    #[serde(rename = "virtual")]
    pub virtual_bus: VirtualConfig,
}

/// Device description.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub name: String,
    /// Stable identifier. A random one is generated at start-up when unset.
    pub identifier: Option<DeviceId>,
}

/// Serial line parity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    None,
    #[default]
    Even,
    Odd,
}

impl Parity {
    fn letter(self) -> char {
        match self {
            Self::None => 'N',
            Self::Even => 'E',
            Self::Odd => 'O',
        }
    }
}

/// Serial line configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path (e.g. `/dev/ttyUSB0`).
    pub port: String,
    /// Bus address of the controller.
    pub addr: u8,
    pub baudrate: u32,
    pub parity: Parity,
    pub bytesize: u8,
    pub stopbits: u8,
    /// Per-request timeout, in seconds.
    pub timeout_secs: u64,
}

/// Controller loop configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Seconds between two global refreshes.
    pub refresh_interval_secs: u64,
    /// Read every flow engine once at start-up.
    pub discover_units: bool,
    /// Capacity of the controller command queue.
    pub command_queue: usize,
    /// Zones registered by hand after discovery.
    pub manual_zones: Vec<ManualZoneConfig>,
}

/// A zone registered by hand.
#[derive(Debug, Clone, Deserialize)]
pub struct ManualZoneConfig {
    pub id: ZoneId,
    pub name: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `zonehub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("zonehub.toml")?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("ZONEHUB_NAME") {
            self.device.name = val;
        }
        if let Ok(val) = std::env::var("ZONEHUB_DEVICE_ID") {
            self.device.identifier = Some(val.parse()?);
        }
        if let Ok(val) = std::env::var("ZONEHUB_SERIAL_PORT") {
            self.serial.port = val;
        }
        if let Ok(val) = std::env::var("ZONEHUB_REFRESH_SECS")
            && let Ok(secs) = val.parse()
        {
            self.controller.refresh_interval_secs = secs;
        }
        if let Ok(val) = std::env::var("ZONEHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.device.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "device name must not be empty".to_string(),
            ));
        }
        if !(1..=247).contains(&self.serial.addr) {
            return Err(ConfigError::Validation(format!(
                "serial address {} outside 1..=247",
                self.serial.addr
            )));
        }
        if !matches!(self.serial.bytesize, 7 | 8) {
            return Err(ConfigError::Validation(format!(
                "bytesize must be 7 or 8, got {}",
                self.serial.bytesize
            )));
        }
        if !matches!(self.serial.stopbits, 1 | 2) {
            return Err(ConfigError::Validation(format!(
                "stopbits must be 1 or 2, got {}",
                self.serial.stopbits
            )));
        }
        if self.serial.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "serial timeout must be non-zero".to_string(),
            ));
        }
        if self.controller.refresh_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "refresh interval must be non-zero".to_string(),
            ));
        }
        if self.controller.command_queue == 0 {
            return Err(ConfigError::Validation(
                "command queue must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the configured identifier, or a freshly generated one.
    #[must_use]
    pub fn device_id(&self) -> DeviceId {
        self.device.identifier.unwrap_or_else(DeviceId::new)
    }

    /// Return the refresh period of the controller loop.
    #[must_use]
    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.controller.refresh_interval_secs)
    }
}

impl fmt::Display for SerialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}{}{} addr={}",
            self.port,
            self.baudrate,
            self.bytesize,
            self.parity.letter(),
            self.stopbits,
            self.addr
        )
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: "Koolnova".to_string(),
            identifier: None,
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            addr: DEFAULT_ADDR,
            baudrate: DEFAULT_BAUDRATE,
            parity: Parity::default(),
            bytesize: DEFAULT_BYTESIZE,
            stopbits: DEFAULT_STOPBITS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 30,
            discover_units: false,
            command_queue: 32,
            manual_zones: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "zonehubd=info,zonehub=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Malformed device identifier in the environment.
    #[error("invalid device identifier")]
    DeviceId(#[from] uuid::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
