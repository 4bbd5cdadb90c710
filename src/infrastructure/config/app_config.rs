//! Application configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::services::{DEFAULT_MAX_RETRIES, DEFAULT_PAGE_SIZE, LoaderConfig};

const APP_QUALIFIER: &str = "io";
const APP_ORGANIZATION: &str = "galleria-tui";
const APP_NAME: &str = "galleria";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Converts to tracing level.
    #[must_use]
    pub const fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Application configuration from CLI, environment, and config file.
///
/// CLI/environment values win; the TOML config file fills anything left
/// unset; accessors resolve the remaining defaults.
#[derive(Debug, Default, Parser, Serialize, Deserialize)]
#[command(name = APP_NAME, version = crate::VERSION, about = "Terminal gallery client")]
pub struct AppConfig {
    /// Gallery server base URL.
    #[arg(long, env = "GALLERIA_SERVER_URL")]
    #[serde(default)]
    pub server_url: Option<String>,

    /// API key sent as a bearer token.
    #[arg(long, env = "GALLERIA_API_KEY", hide_env_values = true)]
    #[serde(skip)]
    pub api_key: Option<String>,

    /// Storage bucket holding the image objects.
    #[arg(long)]
    #[serde(default)]
    pub bucket: Option<String>,

    /// Browse the built-in sample collection without a server.
    #[arg(long)]
    #[serde(default)]
    pub offline: bool,

    /// Configuration file path.
    #[arg(long)]
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long)]
    #[serde(default)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    #[serde(default)]
    pub log_level: Option<LogLevel>,

    /// Items per page / window increment.
    #[arg(long)]
    #[serde(default)]
    pub page_size: Option<usize>,

    /// Automatic retries per image load.
    #[arg(long)]
    #[serde(default)]
    pub max_retries: Option<u32>,

    /// Delay between automatic retries, in milliseconds.
    #[arg(long)]
    #[serde(default)]
    pub retry_delay_ms: Option<u64>,

    /// Maximum concurrent image downloads.
    #[arg(long)]
    #[serde(default)]
    pub max_concurrent_downloads: Option<usize>,

    /// Fallback image URL rendered dimmed on failed cards.
    #[arg(long)]
    #[serde(default)]
    pub fallback_url: Option<String>,

    /// Disk cache directory override.
    #[arg(long)]
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Maximum disk cache size in megabytes.
    #[arg(long)]
    #[serde(default)]
    pub cache_size_mb: Option<u64>,
}

impl AppConfig {
    /// Parses the CLI and merges in the config file, if one exists.
    ///
    /// # Errors
    /// Returns an error if an explicitly given config file cannot be
    /// read or parsed. A missing default config file is not an error.
    pub fn load() -> color_eyre::Result<Self> {
        let mut config = Self::parse();
        let explicit = config.config.clone();
        let path = explicit.clone().or_else(default_config_path);

        if let Some(path) = path {
            match std::fs::read_to_string(&path) {
                Ok(contents) => {
                    let file: Self = toml::from_str(&contents)?;
                    config.merge_file(file);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound && explicit.is_none() => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(config)
    }

    /// Fills unset options from a config file snapshot.
    fn merge_file(&mut self, file: Self) {
        self.server_url = self.server_url.take().or(file.server_url);
        self.bucket = self.bucket.take().or(file.bucket);
        self.offline = self.offline || file.offline;
        self.log_path = self.log_path.take().or(file.log_path);
        self.log_level = self.log_level.or(file.log_level);
        self.page_size = self.page_size.or(file.page_size);
        self.max_retries = self.max_retries.or(file.max_retries);
        self.retry_delay_ms = self.retry_delay_ms.or(file.retry_delay_ms);
        self.max_concurrent_downloads = self
            .max_concurrent_downloads
            .or(file.max_concurrent_downloads);
        self.fallback_url = self.fallback_url.take().or(file.fallback_url);
        self.cache_dir = self.cache_dir.take().or(file.cache_dir);
        self.cache_size_mb = self.cache_size_mb.or(file.cache_size_mb);
    }

    /// Storage bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.bucket.as_deref().unwrap_or("images")
    }

    /// Effective log level.
    #[must_use]
    pub fn log_level(&self) -> LogLevel {
        self.log_level.unwrap_or_default()
    }

    /// Items per page / window increment.
    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1)
    }

    /// Maximum concurrent image downloads.
    #[must_use]
    pub fn max_concurrent_downloads(&self) -> usize {
        self.max_concurrent_downloads.unwrap_or(4).max(1)
    }

    /// Maximum disk cache size in bytes.
    #[must_use]
    pub fn cache_size_bytes(&self) -> u64 {
        self.cache_size_mb.unwrap_or(200) * 1024 * 1024
    }

    /// Load-controller tuning assembled from the config.
    #[must_use]
    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            retry_delay: Duration::from_millis(self.retry_delay_ms.unwrap_or(1000)),
            fallback_url: self.fallback_url.clone(),
        }
    }

    /// Path logging should append to, if any.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(|| {
            project_dirs().map(|dirs| dirs.data_dir().join(format!("{APP_NAME}.log")))
        })
    }
}

/// Project directory bundle for config/cache/data paths.
#[must_use]
pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
}

fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_values_fill_unset_options() {
        let mut config = AppConfig {
            page_size: Some(12),
            ..AppConfig::default()
        };
        let file: AppConfig = toml::from_str(
            r#"
            server_url = "https://gallery.test"
            page_size = 4
            max_retries = 5
            "#,
        )
        .unwrap();

        config.merge_file(file);

        assert_eq!(config.server_url.as_deref(), Some("https://gallery.test"));
        // CLI value wins over the file.
        assert_eq!(config.page_size(), 12);
        assert_eq!(config.max_retries, Some(5));
    }

    #[test]
    fn accessors_resolve_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(config.bucket(), "images");
        assert_eq!(config.log_level(), LogLevel::Info);
        assert_eq!(config.loader_config().max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(
            config.loader_config().retry_delay,
            Duration::from_millis(1000)
        );
    }

    #[test]
    fn zero_page_size_is_clamped() {
        let config = AppConfig {
            page_size: Some(0),
            ..AppConfig::default()
        };
        assert_eq!(config.page_size(), 1);
    }
}
