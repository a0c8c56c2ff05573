//! Configuration System using Figment
//!
//! This module provides strongly-typed configuration loading for the detector's
//! live-status layer. Configuration is loaded from:
//! 1. config/detector.toml file (base configuration, optional)
//! 2. Environment variables (prefixed with DETECTOR_, sections split on `__`)
//!
//! Every field has a default matching a Raspberry Pi deployment with user `pi`,
//! so an empty or missing file yields a usable configuration.
//!
//! # Example
//! ```no_run
//! use detector_live::config::AppConfig;
//!
//! let config = AppConfig::load()?;
//! println!("Application: {}", config.application.name);
//! # Ok::<(), figment::Error>(())
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::tracing_setup::{parse_log_level, OutputFormat};

const MIB: u64 = 1024 * 1024;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application settings
    pub application: ApplicationConfig,
    /// Dashboard notification feed settings
    pub client_log: ClientLogConfig,
    /// Push loop settings
    pub push: PushConfig,
    /// Recording target settings
    pub storage: StorageConfig,
    /// Device power command settings
    pub power: PowerConfig,
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Application name
    pub name: String,
    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Process log format (pretty, compact, json)
    pub log_format: String,
    /// Include source file and line in process log events
    pub log_source_location: bool,
}

/// Dashboard notification feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientLogConfig {
    /// Number of rows kept for the dashboard
    pub capacity: usize,
}

/// Push loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PushConfig {
    /// Interval of the clock tick that refreshes the status section
    pub tick_interval_ms: u64,
}

/// Recording target configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory whose mounted children are removable media
    pub removable_root: PathBuf,
    /// Minimum free space on removable media, in MiB
    pub removable_min_free_mb: u64,
    /// Internal storage root
    pub internal_path: PathBuf,
    /// Directory under the internal root that holds recordings
    pub internal_subdir: PathBuf,
    /// Minimum free space on internal storage, in MiB
    pub internal_min_free_mb: u64,
    /// Target used when the internal root does not exist (non-device host)
    pub fallback_dir: PathBuf,
}

/// Device power command configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerConfig {
    /// File inspected to identify the operating system
    pub os_release_path: PathBuf,
    /// Text that must appear in the os-release file
    pub os_marker: String,
    /// Delay between logging a shutdown/reboot and executing it
    pub action_delay_ms: u64,
    /// Working directory for OS commands
    pub work_dir: PathBuf,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "Detector Live".to_string(),
            log_level: "info".to_string(),
            log_format: OutputFormat::default().as_str().to_string(),
            log_source_location: false,
        }
    }
}

impl Default for ClientLogConfig {
    fn default() -> Self {
        Self { capacity: 80 }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            removable_root: PathBuf::from("/media/pi"),
            removable_min_free_mb: 20,
            internal_path: PathBuf::from("/home/pi"),
            internal_subdir: PathBuf::from("wurb_recordings"),
            internal_min_free_mb: 500,
            fallback_dir: PathBuf::from("wurb_recordings"),
        }
    }
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            os_release_path: PathBuf::from("/etc/os-release"),
            os_marker: "raspbian".to_string(),
            action_delay_ms: 1000,
            work_dir: PathBuf::from("/home/pi"),
        }
    }
}

impl PushConfig {
    /// Tick interval as a `Duration`.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl StorageConfig {
    /// Removable media threshold in bytes, saturating at `u64::MAX`.
    pub fn removable_min_free_bytes(&self) -> u64 {
        self.removable_min_free_mb.saturating_mul(MIB)
    }

    /// Internal storage threshold in bytes, saturating at `u64::MAX`.
    pub fn internal_min_free_bytes(&self) -> u64 {
        self.internal_min_free_mb.saturating_mul(MIB)
    }
}

impl PowerConfig {
    /// Shutdown/reboot delay as a `Duration`.
    pub fn action_delay(&self) -> Duration {
        Duration::from_millis(self.action_delay_ms)
    }
}

impl AppConfig {
    /// Load configuration from config/detector.toml and environment variables
    ///
    /// Environment variables can override configuration with prefix DETECTOR_
    /// Example: DETECTOR_APPLICATION__LOG_LEVEL=debug
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from("config/detector.toml")
    }

    /// Load configuration from a specific file path
    ///
    /// A missing file is not an error; defaults fill every absent field.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("DETECTOR_").split("__"))
            .extract()
    }

    /// Effective configuration as pretty TOML, e.g. to seed a config file.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        parse_log_level(&self.application.log_level)?;
        self.application.log_format.parse::<OutputFormat>()?;

        if self.client_log.capacity == 0 {
            return Err("Invalid client_log.capacity 0. Must be at least 1".to_string());
        }

        if self.push.tick_interval_ms == 0 {
            return Err("Invalid push.tick_interval_ms 0. Must be at least 1".to_string());
        }

        if self.power.os_marker.trim().is_empty() {
            return Err("power.os_marker must not be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.client_log.capacity, 80);
        assert_eq!(config.push.tick_interval(), Duration::from_secs(1));
        assert_eq!(config.storage.removable_min_free_bytes(), 20 * MIB);
        assert_eq!(config.storage.internal_min_free_bytes(), 500 * MIB);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.power.os_marker, "raspbian");
        assert_eq!(config.storage.removable_root, PathBuf::from("/media/pi"));
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [client_log]
            capacity = 10

            [storage]
            removable_min_free_mb = 64
            "#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.client_log.capacity, 10);
        assert_eq!(config.storage.removable_min_free_mb, 64);
        // Untouched fields keep their defaults
        assert_eq!(config.storage.internal_min_free_mb, 500);
        assert_eq!(config.application.log_level, "info");
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = AppConfig::default();
        config.application.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_format() {
        let mut config = AppConfig::default();
        config.application.log_format = "yaml".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.contains("log_format"));

        config.application.log_format = "Pretty".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_huge_threshold_saturates() {
        let mut config = AppConfig::default();
        config.storage.removable_min_free_mb = u64::MAX;
        config.storage.internal_min_free_mb = u64::MAX / 2;

        assert_eq!(config.storage.removable_min_free_bytes(), u64::MAX);
        assert_eq!(config.storage.internal_min_free_bytes(), u64::MAX);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = AppConfig::default();
        config.client_log.capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_printed_config_loads_back() {
        let mut config = AppConfig::default();
        config.storage.internal_subdir = PathBuf::from("bat_recordings");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", config.to_toml_string().unwrap()).unwrap();

        let loaded = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(loaded.storage.internal_subdir, PathBuf::from("bat_recordings"));
    }

    #[test]
    fn test_zero_tick_rejected() {
        let mut config = AppConfig::default();
        config.push.tick_interval_ms = 0;
        assert!(config.validate().is_err());
    }
}
