//! Configuration management for ferromirror
//!
//! Configuration is layered: built-in defaults, then an optional YAML, TOML or
//! JSON file, then environment variables prefixed with `FERROMIRROR` (nested
//! keys separated by `__`, e.g. `FERROMIRROR__SCHEDULE__INTERVAL=30`).
//!
//! # Examples
//!
//! ```rust,no_run
//! use ferromirror_config::ConfigBuilder;
//!
//! let config = ConfigBuilder::new()
//!     .add_defaults()
//!     .add_source_file("ferromirror.yaml")
//!     .add_env_prefix("FERROMIRROR")
//!     .build()
//!     .expect("Failed to load configuration");
//!
//! println!("Interval: {}s", config.schedule.interval.as_secs());
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use ferromirror_types::{ChunkSize, SyncInterval};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod builder;
pub mod error;
pub mod loader;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

/// Main configuration structure for ferromirror
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Synchronizer configuration
    #[serde(default)]
    pub sync: SyncConfig,
    /// Scheduling configuration
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Synchronizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Read chunk size used when fingerprinting files
    #[serde(default)]
    pub chunk_size: ChunkSize,
    /// Carry source access and modification times over to copied files
    #[serde(default = "default_preserve_timestamps")]
    pub preserve_timestamps: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            chunk_size: ChunkSize::default(),
            preserve_timestamps: default_preserve_timestamps(),
        }
    }
}

fn default_preserve_timestamps() -> bool {
    true
}

/// Scheduling configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds to wait between passes
    #[serde(default)]
    pub interval: SyncInterval,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log file path
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Also log to standard output
    #[serde(default = "default_console")]
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_file: None,
            console: default_console(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_console() -> bool {
    true
}

/// Log levels accepted by [`LoggingConfig::level`]
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.sync.chunk_size.get(), ChunkSize::DEFAULT);
        assert!(config.sync.preserve_timestamps);
        assert_eq!(config.schedule.interval.as_secs(), 60);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.log_file.is_none());
        assert!(config.logging.console);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("schedule:\n  interval: 5\n").unwrap();
        assert_eq!(config.schedule.interval.as_secs(), 5);
        assert!(config.sync.preserve_timestamps);
    }

    #[test]
    fn test_invalid_values_are_rejected_on_deserialize() {
        assert!(serde_yaml::from_str::<Config>("schedule:\n  interval: 0\n").is_err());
        assert!(serde_yaml::from_str::<Config>("sync:\n  chunk_size: 1000\n").is_err());
    }
}
