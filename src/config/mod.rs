// src/config/mod.rs - Host configuration
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("target humidity must be a number, got '{0}'")]
    SetpointNotNumeric(String),
    #[error("target humidity must be between 0 and 100 %, got {0}")]
    SetpointOutOfRange(f64),
}

/// Main configuration. Every field has a default matching the bench
/// device, so an absent file or a partial file both produce a runnable
/// setup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub controller: ControllerConfig,

    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub pins: PinConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

/// Control-law parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ControllerConfig {
    /// Humidity setpoint in percent relative humidity.
    #[serde(default = "default_target_humidity")]
    pub target_humidity: f64,

    /// Proportional gain. Higher reacts faster but overshoots more.
    #[serde(default = "default_proportional_gain")]
    pub proportional_gain: f64,

    /// Full-scale heater duty (16-bit PWM resolution).
    #[serde(default = "default_max_duty")]
    pub max_duty: u32,

    /// Seconds between control cycles.
    #[serde(default = "default_sample_period_secs")]
    pub sample_period_secs: u64,
}

/// Serial connection to the MCU bridge.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud")]
    pub baud: u32,
}

/// GPIO assignments on the bridge MCU.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PinConfig {
    #[serde(default = "default_heater_pin")]
    pub heater: u8,

    #[serde(default = "default_fan_pin")]
    pub fan: u8,

    #[serde(default = "default_indicator_pin")]
    pub indicator: u8,

    #[serde(default = "default_sensor_pin")]
    pub sensor: u8,
}

/// OLED geometry and address.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    #[serde(default = "default_display_width")]
    pub width: u32,

    #[serde(default = "default_display_height")]
    pub height: u32,

    #[serde(default = "default_i2c_addr")]
    pub i2c_addr: u8,
}

// Default value functions
fn default_target_humidity() -> f64 {
    30.0
}
fn default_proportional_gain() -> f64 {
    5.0
}
fn default_max_duty() -> u32 {
    65535
}
fn default_sample_period_secs() -> u64 {
    5
}
fn default_serial_port() -> String {
    "/dev/ttyACM0".to_string()
}
fn default_baud() -> u32 {
    115200
}
fn default_heater_pin() -> u8 {
    7
}
fn default_fan_pin() -> u8 {
    8
}
fn default_indicator_pin() -> u8 {
    16
}
fn default_sensor_pin() -> u8 {
    28
}
fn default_display_width() -> u32 {
    128
}
fn default_display_height() -> u32 {
    64
}
fn default_i2c_addr() -> u8 {
    0x3c
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            target_humidity: default_target_humidity(),
            proportional_gain: default_proportional_gain(),
            max_duty: default_max_duty(),
            sample_period_secs: default_sample_period_secs(),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud: default_baud(),
        }
    }
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            heater: default_heater_pin(),
            fan: default_fan_pin(),
            indicator: default_indicator_pin(),
            sensor: default_sensor_pin(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: default_display_width(),
            height: default_display_height(),
            i2c_addr: default_i2c_addr(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            controller: ControllerConfig::default(),
            serial: SerialConfig::default(),
            pins: PinConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file. A missing file is not an
    /// error: the built-in defaults are the source of truth and the
    /// file only overrides them.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Config file '{}' not found, using built-in defaults", path);
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::Io {
                    path: path.to_string(),
                    source: e,
                });
            }
        };

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_string(),
            source: e,
        })?;
        config.validate()?;
        tracing::info!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// Validate configuration before the controller starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.controller;
        if !(0.0..=100.0).contains(&c.target_humidity) {
            return Err(ConfigError::Invalid(format!(
                "target_humidity {} outside 0..=100",
                c.target_humidity
            )));
        }
        if c.proportional_gain <= 0.0 {
            return Err(ConfigError::Invalid(
                "proportional_gain must be positive".to_string(),
            ));
        }
        if c.max_duty == 0 {
            return Err(ConfigError::Invalid("max_duty must be positive".to_string()));
        }
        if c.sample_period_secs == 0 {
            return Err(ConfigError::Invalid(
                "sample_period_secs must be positive".to_string(),
            ));
        }
        if self.serial.port.is_empty() {
            return Err(ConfigError::Invalid(
                "serial port must be specified".to_string(),
            ));
        }
        if self.display.width == 0 || self.display.height == 0 {
            return Err(ConfigError::Invalid(
                "display geometry must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl ControllerConfig {
    /// Validated runtime setter for the humidity setpoint, the only
    /// configuration field mutable while the loop runs. The input is
    /// untrusted operator text; any parse or range failure leaves the
    /// current value in place.
    pub fn set_target_humidity(&mut self, input: &str) -> Result<f64, ConfigError> {
        let requested: f64 = input
            .trim()
            .parse()
            .map_err(|_| ConfigError::SetpointNotNumeric(input.to_string()))?;
        if !(0.0..=100.0).contains(&requested) {
            return Err(ConfigError::SetpointOutOfRange(requested));
        }
        self.target_humidity = requested;
        Ok(requested)
    }

    pub fn sample_period(&self) -> Duration {
        Duration::from_secs(self.sample_period_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_device_defaults() {
        let config = Config::default();
        assert_eq!(config.controller.target_humidity, 30.0);
        assert_eq!(config.controller.proportional_gain, 5.0);
        assert_eq!(config.controller.max_duty, 65535);
        assert_eq!(config.controller.sample_period_secs, 5);
        assert_eq!(config.pins.heater, 7);
        assert_eq!(config.pins.fan, 8);
        assert_eq!(config.pins.sensor, 28);
        assert_eq!(config.display.width, 128);
        assert_eq!(config.display.height, 64);
        assert_eq!(config.display.i2c_addr, 0x3c);
        assert_eq!(config.serial.baud, 115200);
    }

    #[test]
    fn test_parse_toml_with_partial_override() {
        let toml_config = r#"
[controller]
target_humidity = 45.0

[serial]
port = "/dev/ttyUSB1"
"#;

        let config: Config = toml::from_str(toml_config).unwrap();

        assert_eq!(config.controller.target_humidity, 45.0);
        // Untouched tables and fields keep their defaults.
        assert_eq!(config.controller.proportional_gain, 5.0);
        assert_eq!(config.serial.port, "/dev/ttyUSB1");
        assert_eq!(config.serial.baud, 115200);
        assert_eq!(config.pins.fan, 8);
    }

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        let config = Config::load("/nonexistent/heatbox.toml").unwrap();
        assert_eq!(config.controller.target_humidity, 30.0);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heatbox.toml");
        std::fs::write(&path, "[controller]\ntarget_humidity = 40.0\n").unwrap();

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.controller.target_humidity, 40.0);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heatbox.toml");
        std::fs::write(&path, "[controller]\nproportional_gain = -1.0\n").unwrap();

        assert!(Config::load(path.to_str().unwrap()).is_err());
    }

    #[test]
    fn test_set_target_accepts_valid_input() {
        let mut config = ControllerConfig::default();
        assert_eq!(config.set_target_humidity("45").unwrap(), 45.0);
        assert_eq!(config.target_humidity, 45.0);
        // Repeating the same valid input lands on the same value.
        assert_eq!(config.set_target_humidity("45").unwrap(), 45.0);
        assert_eq!(config.target_humidity, 45.0);
        // Boundary values are inside the accepted range.
        assert_eq!(config.set_target_humidity("0").unwrap(), 0.0);
        assert_eq!(config.set_target_humidity("100").unwrap(), 100.0);
    }

    #[test]
    fn test_set_target_rejects_out_of_range() {
        let mut config = ControllerConfig::default();
        config.set_target_humidity("45").unwrap();

        let err = config.set_target_humidity("150").unwrap_err();
        assert!(err.to_string().contains("150"));
        assert_eq!(config.target_humidity, 45.0);

        assert!(config.set_target_humidity("-3").is_err());
        assert!(config.set_target_humidity("nan").is_err());
        assert_eq!(config.target_humidity, 45.0);
    }

    #[test]
    fn test_set_target_rejects_non_numeric() {
        let mut config = ControllerConfig::default();
        config.set_target_humidity("45").unwrap();

        let err = config.set_target_humidity("abc").unwrap_err();
        assert!(err.to_string().contains("abc"));
        assert_eq!(config.target_humidity, 45.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.controller.proportional_gain = 0.0;
        assert!(config.validate().is_err());
        config.controller.proportional_gain = 5.0;

        config.controller.target_humidity = 120.0;
        assert!(config.validate().is_err());
        config.controller.target_humidity = 30.0;

        config.serial.port = String::new();
        assert!(config.validate().is_err());
    }
}
