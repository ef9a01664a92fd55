/*!
 * Configuration management for the powerline workspace.
 *
 * This module provides functionality to load, validate, and access configuration
 * settings for the modem, lighting defaults and the simulated driver.
 */
use std::path::Path;

use config::{Config as ConfigLib, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::Capability;

/// Default ramp level used when a caller does not supply one
pub const DEFAULT_RAMP_LEVEL: u8 = 128;

/// Lowest ramp level a device accepts
pub const RAMP_LEVEL_MIN: u8 = 1;

/// Highest ramp level a device accepts
pub const RAMP_LEVEL_MAX: u8 = 255;

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General configuration
    #[serde(default)]
    pub general: GeneralConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Modem configuration
    #[serde(default)]
    pub modem: ModemConfig,

    /// Lighting defaults
    #[serde(default)]
    pub lighting: LightingConfig,

    /// Simulated driver contents
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Application name
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Application environment (development, production, etc.)
    #[serde(default = "default_environment")]
    pub environment: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error, `powerline_devices=debug`)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to include the event target in log lines
    #[serde(default = "default_with_target")]
    pub with_target: bool,
}

/// Modem configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModemConfig {
    /// Transport identifier, e.g. `COM4` or `/dev/ttyUSB0`
    #[serde(default = "default_port")]
    pub port: String,

    /// Name of the driver that talks to the modem
    #[serde(default = "default_driver")]
    pub driver: String,
}

/// Lighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightingConfig {
    /// Ramp level used when none is given (1-255)
    ///
    /// Kept wide so out-of-range values reach `validate` instead of being
    /// narrowed by the loader.
    #[serde(default = "default_ramp_level")]
    pub default_ramp_level: i64,
}

impl LightingConfig {
    /// The default ramp level, once `validate` has accepted it
    pub fn ramp_level(&self) -> Result<u8> {
        u8::try_from(self.default_ramp_level)
            .ok()
            .filter(|level| *level >= RAMP_LEVEL_MIN)
            .ok_or_else(|| {
                Error::config(format!(
                    "lighting.default_ramp_level must be between {} and {}, got {}",
                    RAMP_LEVEL_MIN, RAMP_LEVEL_MAX, self.default_ramp_level
                ))
            })
    }
}

/// Contents of the simulated modem
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// When set, reading the link database fails with this diagnostic
    #[serde(default)]
    pub database_error: Option<String>,

    /// Devices in the simulated all-link database, in database order
    #[serde(default)]
    pub devices: Vec<SimulatedDeviceConfig>,
}

/// One simulated device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatedDeviceConfig {
    /// Device address
    pub id: String,

    /// Capability reported on connect; falls back to `category`, then generic
    #[serde(default)]
    pub capability: Option<Capability>,

    /// Insteon device category byte (0-255)
    #[serde(default)]
    pub category: Option<i64>,

    /// Insteon device subcategory byte (0-255)
    #[serde(default)]
    pub subcategory: Option<i64>,

    /// Free-form description reported by the device
    #[serde(default)]
    pub description: Option<String>,

    /// When set, connecting fails with this diagnostic
    #[serde(default)]
    pub connect_error: Option<String>,

    /// When set, every command sent to the device fails with this diagnostic
    #[serde(default)]
    pub send_error: Option<String>,
}

impl SimulatedDeviceConfig {
    /// Capability the simulated device reports
    pub fn reported_capability(&self) -> Capability {
        self.capability
            .or_else(|| self.category_byte().map(Capability::from_category))
            .unwrap_or(Capability::Generic)
    }

    /// `category` as a byte; `None` when unset or out of range
    pub fn category_byte(&self) -> Option<u8> {
        self.category.and_then(|c| u8::try_from(c).ok())
    }

    /// `subcategory` as a byte; `None` when unset or out of range
    pub fn subcategory_byte(&self) -> Option<u8> {
        self.subcategory.and_then(|c| u8::try_from(c).ok())
    }

    fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::config(format!(
                "simulation device with empty id: {:?}",
                self
            )));
        }
        for (key, value) in [("category", self.category), ("subcategory", self.subcategory)] {
            if let Some(value) = value {
                if u8::try_from(value).is_err() {
                    return Err(Error::config(format!(
                        "simulation device {}: {} must be between 0 and 255, got {}",
                        self.id, key, value
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            environment: default_environment(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            with_target: default_with_target(),
        }
    }
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            driver: default_driver(),
        }
    }
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            default_ramp_level: default_ramp_level(),
        }
    }
}

fn default_app_name() -> String {
    "powerline".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_with_target() -> bool {
    true
}

fn default_port() -> String {
    "COM4".to_string()
}

fn default_driver() -> String {
    "simulated".to_string()
}

fn default_ramp_level() -> i64 {
    i64::from(DEFAULT_RAMP_LEVEL)
}

impl Config {
    /// Check values that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.modem.port.trim().is_empty() {
            return Err(Error::config("modem.port must not be empty"));
        }
        if self.modem.driver.trim().is_empty() {
            return Err(Error::config("modem.driver must not be empty"));
        }
        self.lighting.ramp_level()?;
        for device in &self.simulation.devices {
            device.validate()?;
        }
        Ok(())
    }
}

/// A builder for creating a configuration
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_file: Option<String>,
    environment_prefix: Option<String>,
    overrides: Vec<(String, String)>,
}

impl ConfigBuilder {
    /// Create a new ConfigBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the config file path
    pub fn with_config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Set the environment variable prefix for configuration
    pub fn with_environment_prefix<S: AsRef<str>>(mut self, prefix: S) -> Self {
        self.environment_prefix = Some(prefix.as_ref().to_string());
        self
    }

    /// Override a single key (e.g. `modem.port`) after every other source
    pub fn with_override<K: AsRef<str>, V: AsRef<str>>(mut self, key: K, value: V) -> Self {
        self.overrides
            .push((key.as_ref().to_string(), value.as_ref().to_string()));
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<Config> {
        let mut config_builder = ConfigLib::builder();

        // Missing keys fall back to the serde defaults above
        if let Some(config_file) = self.config_file {
            let path = Path::new(&config_file);
            if path.exists() {
                debug!("Loading configuration from {}", config_file);
                config_builder = config_builder.add_source(File::with_name(&config_file));
            } else {
                debug!("Configuration file {} does not exist, using defaults", config_file);
            }
        }

        if let Some(prefix) = self.environment_prefix {
            debug!("Loading configuration from environment variables with prefix {}", prefix);
            config_builder = config_builder.add_source(
                Environment::with_prefix(&prefix)
                    .separator("__")
                    .try_parsing(true),
            );
        }

        for (key, value) in self.overrides {
            config_builder = config_builder
                .set_override(key.as_str(), value)
                .map_err(|e| Error::config(format!("Invalid override {}: {}", key, e)))?;
        }

        let config_lib = config_builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build configuration: {}", e)))?;

        let config: Config = config_lib
            .try_deserialize()
            .map_err(|e| Error::config(format!("Failed to deserialize configuration: {}", e)))?;

        config.validate()?;

        info!("Configuration loaded successfully");
        Ok(config)
    }
}
