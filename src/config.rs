//! Configuration management for `railcast`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::RailcastError;
use crate::analysis::distribution::MAX_BINS;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for `railcast`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RailcastConfig {
    /// Daily CSV download settings
    #[serde(default)]
    pub download: DownloadConfig,
    /// Realtime Trains API settings
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Response cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Statistics settings
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Daily CSV download settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory the per-day files are saved in
    #[serde(default = "default_dest_dir")]
    pub dest_dir: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Number of attempts per day (transient failures are also retried by the client)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay between attempts in milliseconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Days fetched at the same time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Optional basic-auth username for the download server
    #[serde(default)]
    pub username: Option<String>,
    /// Optional basic-auth password for the download server
    #[serde(default)]
    pub password: Option<String>,
}

/// Realtime Trains API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// API base URL
    #[serde(default = "default_realtime_base_url")]
    pub base_url: String,
    /// API username
    #[serde(default)]
    pub username: Option<String>,
    /// API password
    #[serde(default)]
    pub password: Option<String>,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether realtime responses are cached
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    /// Cache TTL in hours
    #[serde(default = "default_cache_ttl")]
    pub ttl_hours: u32,
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Statistics settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Fixed histogram bin count; 0 selects bins automatically
    #[serde(default)]
    pub histogram_bins: usize,
    /// IQR multiplier for box-plot whiskers and outlier fences
    #[serde(default = "default_whisker_multiplier")]
    pub whisker_multiplier: f64,
}

// Default value functions
fn default_dest_dir() -> String {
    "data/raw".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    1000
}

fn default_user_agent() -> String {
    format!("railcast/{}", crate::VERSION)
}

fn default_concurrency() -> usize {
    1
}

fn default_realtime_base_url() -> String {
    "https://api.rtt.io/api/v1".to_string()
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl() -> u32 {
    24 * 30
}

fn default_cache_location() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("railcast").to_string_lossy().to_string())
        .unwrap_or_else(|| ".railcast-cache".to_string())
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_whisker_multiplier() -> f64 {
    1.5
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            dest_dir: default_dest_dir(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay(),
            user_agent: default_user_agent(),
            concurrency: default_concurrency(),
            username: None,
            password: None,
        }
    }
}

impl DownloadConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.timeout_seconds))
    }

    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            base_url: default_realtime_base_url(),
            username: None,
            password: None,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_hours: default_cache_ttl(),
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            histogram_bins: 0,
            whisker_multiplier: default_whisker_multiplier(),
        }
    }
}

impl RailcastConfig {
    /// Load configuration from the default location and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let explicit = config_path.is_some();
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("railcast.toml"))
        });

        if explicit && !config_file.exists() {
            return Err(RailcastError::config(format!(
                "Config file not found: {}",
                config_file.display()
            ))
            .into());
        }

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // RAILCAST__DOWNLOAD__MAX_RETRIES=5 and friends
        builder = builder.add_source(
            Environment::with_prefix("RAILCAST")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: RailcastConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("railcast").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.download.dest_dir.is_empty() {
            self.download.dest_dir = default_dest_dir();
        }
        if self.download.timeout_seconds == 0 {
            self.download.timeout_seconds = default_timeout();
        }
        if self.download.user_agent.is_empty() {
            self.download.user_agent = default_user_agent();
        }
        if self.download.concurrency == 0 {
            self.download.concurrency = default_concurrency();
        }
        if self.realtime.base_url.is_empty() {
            self.realtime.base_url = default_realtime_base_url();
        }
        if self.cache.ttl_hours == 0 {
            self.cache.ttl_hours = default_cache_ttl();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_credentials()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Credentials must come in pairs
    pub fn validate_credentials(&self) -> Result<()> {
        let pairs = [
            ("download", &self.download.username, &self.download.password),
            ("realtime", &self.realtime.username, &self.realtime.password),
        ];
        for (section, username, password) in pairs {
            if username.is_some() != password.is_some() {
                return Err(RailcastError::config(format!(
                    "{section}: username and password must be provided together"
                ))
                .into());
            }
        }
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.download.timeout_seconds > 300 {
            return Err(RailcastError::config("Download timeout cannot exceed 300 seconds").into());
        }

        if self.download.max_retries > 10 {
            return Err(RailcastError::config("Download max retries cannot exceed 10").into());
        }

        if self.download.retry_delay_ms > 60_000 {
            return Err(RailcastError::config("Retry delay cannot exceed 60000 ms").into());
        }

        if self.download.concurrency > 16 {
            return Err(RailcastError::config("Download concurrency cannot exceed 16").into());
        }

        if self.analysis.histogram_bins > MAX_BINS {
            return Err(RailcastError::config(format!("Histogram bins cannot exceed {MAX_BINS}")).into());
        }

        let multiplier = self.analysis.whisker_multiplier;
        if multiplier.is_nan() || multiplier <= 0.0 {
            return Err(RailcastError::config("Whisker multiplier must be positive").into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(RailcastError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(RailcastError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.realtime.base_url.starts_with("http://")
            && !self.realtime.base_url.starts_with("https://")
        {
            return Err(RailcastError::config(
                "Realtime API base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = RailcastConfig::default();
        assert_eq!(config.download.dest_dir, "data/raw");
        assert_eq!(config.download.max_retries, 3);
        assert_eq!(config.download.timeout_seconds, 30);
        assert!(config.download.user_agent.starts_with("railcast/"));
        assert_eq!(config.realtime.base_url, "https://api.rtt.io/api/v1");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.analysis.whisker_multiplier, 1.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_unpaired_credentials() {
        let mut config = RailcastConfig::default();
        config.realtime.username = Some("rttuser".to_string());
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("realtime"));
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = RailcastConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = RailcastConfig::default();
        config.download.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));
    }

    #[test]
    fn test_apply_defaults_fills_zeroes() {
        let mut config = RailcastConfig::default();
        config.download.concurrency = 0;
        config.logging.format = String::new();
        config.apply_defaults();
        assert_eq!(config.download.concurrency, 1);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            "[download]\nmax_retries = 5\ndest_dir = \"downloads\"\n\n[analysis]\nhistogram_bins = 12"
        )
        .unwrap();

        let config = RailcastConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.download.max_retries, 5);
        assert_eq!(config.download.dest_dir, "downloads");
        assert_eq!(config.analysis.histogram_bins, 12);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_explicit_config_file() {
        let result = RailcastConfig::load_from_path(Some(PathBuf::from("/nonexistent/railcast.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = RailcastConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("railcast"));
            assert!(path.to_string_lossy().ends_with("config.toml"));
        }
    }
}
