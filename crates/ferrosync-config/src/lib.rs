//! Configuration management system for ferrosync
//!
//! This crate provides layered configuration for the backup engine, the daily
//! scheduler and the log sink.
//!
//! # Features
//!
//! - **Multiple formats**: YAML, TOML and JSON configuration files
//! - **Validation**: every loaded configuration is checked before use
//! - **Environment overrides**: `FERROSYNC__SECTION__KEY` variables win over files
//! - **Defaults**: sensible values for every option, matching a nightly 02:00 backup
//!
//! # Examples
//!
//! ```rust
//! use ferrosync_config::{Config, ConfigBuilder};
//!
//! let config = ConfigBuilder::new()
//!     .add_source_file("ferrosync.yaml")
//!     .add_env_prefix("FERROSYNC")
//!     .build()
//!     .expect("Failed to load configuration");
//!
//! println!("Daily backup at {}", config.schedule.daily_time);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use ferrosync_types::{BufferSize, DailyTime, StatFailurePolicy};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub mod builder;
pub mod error;
pub mod loader;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

/// Main configuration structure for ferrosync
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Copy engine configuration
    pub sync: SyncConfig,
    /// Daily scheduler configuration
    pub schedule: ScheduleConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Copy engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Buffer size for streaming file contents
    pub buffer_size: BufferSize,
    /// Files larger than this get in-flight progress logging (in bytes)
    pub large_file_threshold: u64,
    /// Bytes between in-flight progress lines for large files
    pub large_file_progress_interval: u64,
    /// Emit a status line after this many copied files
    pub progress_every_files: u64,
    /// Emit a status line after this many unchanged files
    pub skipped_progress_every: u64,
    /// Copy permission bits along with contents
    pub preserve_permissions: bool,
    /// Source must be newer than destination by more than this to count as changed.
    /// FAT-formatted drives store times with two second resolution.
    pub mtime_tolerance_ms: u64,
    /// What to do when destination metadata cannot be read
    pub stat_failure_policy: StatFailurePolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            buffer_size: BufferSize::default(),
            large_file_threshold: 100 * 1024 * 1024,        // 100MB
            large_file_progress_interval: 64 * 1024 * 1024, // 64MB
            progress_every_files: 100,
            skipped_progress_every: 1000,
            preserve_permissions: true,
            mtime_tolerance_ms: 0,
            stat_failure_policy: StatFailurePolicy::Copy,
        }
    }
}

impl SyncConfig {
    /// Modification time tolerance as a duration
    pub fn mtime_tolerance(&self) -> Duration {
        Duration::from_millis(self.mtime_tolerance_ms)
    }
}

/// Daily scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Local time of the daily run, `HH:MM`
    pub daily_time: String,
    /// Longest single sleep while waiting for the next run (in seconds)
    pub poll_interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            daily_time: DailyTime::default().to_string(),
            poll_interval_secs: 60,
        }
    }
}

impl ScheduleConfig {
    /// Parsed daily time
    pub fn daily_time(&self) -> ConfigResult<DailyTime> {
        self.daily_time
            .parse()
            .map_err(|message: String| ConfigError::invalid_value("schedule.daily_time", message))
    }

    /// Poll interval as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Directory for the daily log files
    ///
    /// Files are named `ferrosync.YYYY-MM-DD.log` after the UTC date and roll over at UTC
    /// midnight, not local midnight.
    pub log_dir: PathBuf,
    /// Fixed log file instead of one file per day
    pub log_file: Option<PathBuf>,
    /// Enable JSON formatting
    pub json_format: bool,
    /// Enable colored terminal output
    pub colored_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("."),
            log_file: None,
            json_format: false,
            colored_output: true,
        }
    }
}
