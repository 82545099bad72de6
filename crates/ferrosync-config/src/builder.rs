//! Configuration builder for layered configuration loading

use crate::{Config, ConfigError, ConfigResult};
use config::{ConfigBuilder as ConfigBuilderInner, Environment, File, FileFormat};
use ferrosync_types::BufferSize;
use std::path::{Path, PathBuf};

/// Separator between section and key in environment overrides (`FERROSYNC__SYNC__BUFFER_SIZE`)
const ENV_SEPARATOR: &str = "__";

/// Configuration builder for loading configuration from multiple sources
///
/// Sources are applied in the order they were added on top of [`Config::default`].
#[derive(Debug)]
pub struct ConfigBuilder {
    inner: ConfigBuilderInner<config::builder::DefaultState>,
    sources: Vec<ConfigSource>,
}

#[derive(Debug, Clone)]
enum ConfigSource {
    File { path: PathBuf, format: FileFormat },
    Environment { prefix: String },
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self {
            inner: config::Config::builder(),
            sources: Vec::new(),
        }
    }

    /// Add a configuration file source; missing files are ignored
    pub fn add_source_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let format = Self::detect_format(&path);
        self.sources.push(ConfigSource::File { path, format });
        self
    }

    /// Add environment variable source with prefix
    pub fn add_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.sources.push(ConfigSource::Environment {
            prefix: prefix.into(),
        });
        self
    }

    /// Build the configuration
    pub fn build(mut self) -> ConfigResult<Config> {
        let defaults = serde_yaml::to_value(Config::default())
            .map_err(|e| ConfigError::other(format!("Failed to serialize defaults: {}", e)))?;
        self.inner = self
            .inner
            .add_source(config::Config::try_from(&defaults)?);

        for source in &self.sources {
            match source {
                ConfigSource::File { path, format } => {
                    if path.exists() {
                        self.inner = self
                            .inner
                            .add_source(File::from(path.clone()).format(*format));
                    }
                }
                ConfigSource::Environment { prefix } => {
                    self.inner = self.inner.add_source(
                        Environment::with_prefix(prefix)
                            .separator(ENV_SEPARATOR)
                            .try_parsing(true),
                    );
                }
            }
        }

        let config = self.inner.build()?;
        let result: Config = config.try_deserialize()?;

        Self::validate(&result)?;

        Ok(result)
    }

    /// Detect file format from extension
    fn detect_format(path: &Path) -> FileFormat {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => FileFormat::Toml,
            Some("json") => FileFormat::Json,
            _ => FileFormat::Yaml,
        }
    }

    /// Validate the configuration
    pub fn validate(config: &Config) -> ConfigResult<()> {
        BufferSize::new(config.sync.buffer_size.get())
            .map_err(|message| ConfigError::invalid_value("sync.buffer_size", message))?;

        if config.sync.large_file_progress_interval == 0 {
            return Err(ConfigError::validation(
                "Large file progress interval must be greater than 0",
            ));
        }

        if config.sync.progress_every_files == 0 || config.sync.skipped_progress_every == 0 {
            return Err(ConfigError::validation(
                "Progress intervals must be greater than 0",
            ));
        }

        config.schedule.daily_time()?;

        if config.schedule.poll_interval_secs == 0 {
            return Err(ConfigError::validation(
                "Scheduler poll interval must be greater than 0",
            ));
        }

        if let Some(log_file) = &config.logging.log_file {
            if log_file.file_name().is_none() {
                return Err(ConfigError::invalid_value(
                    "logging.log_file",
                    format!("'{}' does not name a file", log_file.display()),
                ));
            }
        }

        Ok(())
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_build_defaults() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.sync.progress_every_files, 100);
        assert_eq!(config.schedule.daily_time, "02:00");
    }

    #[test]
    fn test_missing_file_is_ignored() {
        let config = ConfigBuilder::new()
            .add_source_file("/nonexistent/ferrosync.yaml")
            .build()
            .unwrap();
        assert_eq!(config.sync.skipped_progress_every, 1000);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ferrosync.toml");
        fs::write(
            &path,
            "[schedule]\ndaily_time = \"03:30\"\n\n[sync]\nstat_failure_policy = \"skip\"\n",
        )
        .unwrap();

        let config = ConfigBuilder::new().add_source_file(&path).build().unwrap();
        assert_eq!(config.schedule.daily_time, "03:30");
        assert_eq!(
            config.sync.stat_failure_policy,
            ferrosync_types::StatFailurePolicy::Skip
        );
        assert_eq!(config.sync.progress_every_files, 100);
    }

    #[test]
    fn test_environment_overrides_nested_keys() {
        // Prefix unique to this test so parallel tests never see the variable
        std::env::set_var("FERROSYNC_BUILDER_TEST__SCHEDULE__POLL_INTERVAL_SECS", "30");

        let config = ConfigBuilder::new()
            .add_env_prefix("FERROSYNC_BUILDER_TEST")
            .build();
        std::env::remove_var("FERROSYNC_BUILDER_TEST__SCHEDULE__POLL_INTERVAL_SECS");

        let config = config.unwrap();
        assert_eq!(config.schedule.poll_interval_secs, 30);
        assert_eq!(config.schedule.daily_time, "02:00");
    }

    #[rstest]
    #[case("schedule:\n  daily_time: \"7:00\"\n")]
    #[case("schedule:\n  poll_interval_secs: 0\n")]
    #[case("sync:\n  buffer_size: 5000\n")]
    #[case("sync:\n  progress_every_files: 0\n")]
    fn test_invalid_files_are_rejected(#[case] content: &str) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ferrosync.yaml");
        fs::write(&path, content).unwrap();

        assert!(ConfigBuilder::new().add_source_file(&path).build().is_err());
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(
            ConfigBuilder::detect_format(Path::new("a.toml")),
            FileFormat::Toml
        );
        assert_eq!(
            ConfigBuilder::detect_format(Path::new("a.json")),
            FileFormat::Json
        );
        assert_eq!(
            ConfigBuilder::detect_format(Path::new("a.yml")),
            FileFormat::Yaml
        );
    }
}
