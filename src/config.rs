//! # Configuration Management Module
//!
//! Persistent dashboard settings stored in platform-appropriate locations.
//! Handles loading, saving, validating and providing defaults.
//!
//! ## Settings
//! - `data_file`: JSON readings document served by the file source
//! - `devices`: devices shown on the ward overview
//! - `default_range`: relative window for the detail chart (e.g. `-1h`)
//! - `ward_lookback`: window used for the latest-reading cards (e.g. `-5m`)
//! - `detail_poll_secs` / `ward_poll_secs`: refresh periods
//! - `display_utc_offset_minutes`: offset applied to axis labels
//!
//! ## Storage Location
//! - macOS: ~/Library/Application Support/ward-vitals/config.toml
//! - Linux: ~/.config/ward-vitals/config.toml
//! - Windows: %APPDATA%\ward-vitals\config.toml

use crate::error::ConfigError;
use crate::window::TimeWindow;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_file: PathBuf,
    pub devices: Vec<String>,
    pub default_range: String,
    pub ward_lookback: String,
    pub detail_poll_secs: u64,
    pub ward_poll_secs: u64,
    pub display_utc_offset_minutes: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("readings.json"),
            devices: vec!["Hospital03".to_string()],
            default_range: "-1h".to_string(),
            ward_lookback: "-5m".to_string(),
            detail_poll_secs: 5,
            ward_poll_secs: 3,
            display_utc_offset_minutes: 0,
        }
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ward-vitals")
            .join("config.toml")
    }

    /// Load config from the default location, or create default if it doesn't exist
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`, writing the default there when absent
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => {
                let config: Config = toml::from_str(&contents).map_err(ConfigError::ParseFailed)?;
                config.validate()?;
                log::info!("Loaded config from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.save_to(path)?;
                log::info!("Wrote default config to {}", path.display());
                Ok(config)
            }
            Err(e) => Err(ConfigError::ReadFailed(e)),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::WriteFailed)?;
        }

        let toml_string = toml::to_string_pretty(self).map_err(ConfigError::SerializeFailed)?;
        fs::write(path, toml_string).map_err(ConfigError::WriteFailed)?;

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.detail_poll_secs == 0 || self.ward_poll_secs == 0 {
            return Err(ConfigError::Invalid("poll periods must be at least 1 second".to_string()));
        }
        self.detail_window()?;
        self.ward_window()?;
        Ok(())
    }

    pub fn detail_window(&self) -> Result<TimeWindow, ConfigError> {
        self.default_range
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("default_range: {}", e)))
    }

    pub fn ward_window(&self) -> Result<TimeWindow, ConfigError> {
        self.ward_lookback
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("ward_lookback: {}", e)))
    }

    pub fn detail_period(&self) -> Duration {
        Duration::from_secs(self.detail_poll_secs)
    }

    pub fn ward_period(&self) -> Duration {
        Duration::from_secs(self.ward_poll_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::RangePreset;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.detail_poll_secs, 5);
        assert_eq!(config.ward_poll_secs, 3);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.detail_window().unwrap(),
            TimeWindow::Preset(RangePreset::LastHour)
        );
    }

    #[test]
    fn test_config_serialization() {
        let config = Config {
            devices: vec!["Hospital01".to_string(), "Hospital04".to_string()],
            default_range: "-24h".to_string(),
            ..Config::default()
        };

        let toml_str = toml::to_string(&config).expect("Failed to serialize");
        assert!(toml_str.contains("default_range = \"-24h\""));
        assert!(toml_str.contains("Hospital04"));
    }

    #[test]
    fn test_config_deserialization_fills_defaults() {
        let toml_str = r#"
            devices = ["Hospital02"]
            ward_poll_secs = 10
        "#;

        let config: Config = toml::from_str(toml_str).expect("Failed to deserialize");
        assert_eq!(config.devices, vec!["Hospital02".to_string()]);
        assert_eq!(config.ward_poll_secs, 10);
        assert_eq!(config.detail_poll_secs, 5);
        assert_eq!(config.default_range, "-1h");
    }

    #[test]
    fn test_config_load_creates_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).expect("Failed to load config");
        assert_eq!(config, Config::default());
        assert!(path.exists());

        let reloaded = Config::load_from(&path).expect("Failed to reload config");
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let zero_poll = Config {
            ward_poll_secs: 0,
            ..Config::default()
        };
        assert!(matches!(zero_poll.validate(), Err(ConfigError::Invalid(_))));

        let bad_range = Config {
            default_range: "last week".to_string(),
            ..Config::default()
        };
        assert!(matches!(bad_range.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_rejects_bad_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "ward_poll_secs = \"often\"").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::ParseFailed(_))));
    }
}
