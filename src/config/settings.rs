//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable that overrides the API base URL on its own
pub const API_URL_ENV: &str = "CAMPUS_API_URL";

/// Default backend used during local development
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub qr: QrConfig,
    pub logging: LoggingConfig,
}

/// Campus API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Unset means the transport default (no timeout).
    pub timeout_seconds: Option<u64>,
    pub user_agent: String,
}

/// Credential storage configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub credentials_path: Option<PathBuf>,
}

/// QR attendance configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QrConfig {
    /// Pause after each decode attempt before frames are looked at again
    pub debounce_millis: u64,
    /// Reject payloads whose timestamp is further away than this
    pub max_payload_age_seconds: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for the daily rolling log file; stderr only when unset
    pub file_path: Option<PathBuf>,
    pub json: bool,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::load(None)
    }

    /// Load settings, reading `path` instead of `campus.toml` when given
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let file_source = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("campus").required(false),
        };

        let settings = config::Config::builder()
            .add_source(file_source)
            .add_source(
                config::Environment::with_prefix("CAMPUS")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let mut settings: Settings = settings.try_deserialize()?;
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                settings.api.base_url = url;
            }
        }
        Ok(settings)
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::CampusError> {
        super::validation::validate_settings(self)
    }

    /// Where the bearer token and cached user are kept
    pub fn credentials_path(&self) -> PathBuf {
        self.storage.credentials_path.clone().unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("campus-events")
                .join("credentials.json")
        })
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

impl QrConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_millis)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            storage: StorageConfig::default(),
            qr: QrConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_seconds: None,
            user_agent: format!("campus-events/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            debounce_millis: 1200,
            max_payload_age_seconds: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file_path: None,
            json: false,
        }
    }
}
