//! Log sink setup
//!
//! Terminal output and the log file are two `fmt` layers with separate filters. The file
//! rolls over daily (`ferrosync.YYYY-MM-DD.log`, UTC date) unless a fixed file is requested.

use anyhow::{Context, Result};
use ferrosync_config::LoggingConfig;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Prefix of the daily log files
pub const LOG_FILE_PREFIX: &str = "ferrosync";

/// Verbosity chosen on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verbosity {
    /// `--debug`
    pub debug: bool,
    /// `--verbose`
    pub verbose: bool,
    /// `--quiet`
    pub quiet: bool,
}

impl Verbosity {
    /// Level for terminal output
    pub fn terminal_level(self) -> &'static str {
        if self.debug {
            "debug"
        } else if self.verbose {
            "info"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }

    /// Level for the log file; `--debug` wins over the configured level
    pub fn file_level(self, configured: &str) -> String {
        if self.debug {
            "debug".to_string()
        } else {
            configured.to_string()
        }
    }
}

/// Install the global subscriber
///
/// The returned guard flushes the file writer when dropped and must live until exit.
/// With `stderr_only` the terminal layer never writes to stdout, which is kept for JSON.
pub fn init_logging(
    config: &LoggingConfig,
    verbosity: Verbosity,
    stderr_only: bool,
) -> Result<WorkerGuard> {
    let appender = file_appender(config)?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let terminal_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.terminal_level()));
    let file_filter = EnvFilter::try_new(verbosity.file_level(&config.level))
        .with_context(|| format!("Invalid log level '{}'", config.level))?;

    let terminal_writer = if stderr_only {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = Vec::new();
    layers.push(
        fmt::layer()
            .with_writer(terminal_writer)
            .with_ansi(config.colored_output)
            .with_target(false)
            .with_filter(terminal_filter)
            .boxed(),
    );
    if config.json_format {
        layers.push(
            fmt::layer()
                .json()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(file_filter)
                .boxed(),
        );
    } else {
        layers.push(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(false)
                .with_filter(file_filter)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(guard)
}

/// Daily rolling appender in `log_dir`, or a single file when `log_file` is set
fn file_appender(config: &LoggingConfig) -> Result<RollingFileAppender> {
    if let Some(log_file) = &config.log_file {
        let directory = log_file
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let file_name = log_file
            .file_name()
            .with_context(|| format!("'{}' does not name a file", log_file.display()))?;
        std::fs::create_dir_all(directory)
            .with_context(|| format!("Failed to create log directory '{}'", directory.display()))?;
        return Ok(tracing_appender::rolling::never(directory, file_name));
    }

    std::fs::create_dir_all(&config.log_dir).with_context(|| {
        format!(
            "Failed to create log directory '{}'",
            config.log_dir.display()
        )
    })?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(&config.log_dir)
        .context("Failed to open daily log file")
}
