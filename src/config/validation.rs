//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use url::Url;

use super::Settings;
use crate::utils::errors::{CampusError, Result};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_api_config(&settings.api)?;
    validate_qr_config(&settings.qr)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate API configuration
fn validate_api_config(config: &super::ApiConfig) -> Result<()> {
    if config.base_url.trim().is_empty() {
        return Err(CampusError::Config("API base URL is required".to_string()));
    }

    let url = Url::parse(&config.base_url)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(CampusError::Config(format!(
            "API base URL must use http or https, got: {}",
            url.scheme()
        )));
    }

    if config.timeout_seconds == Some(0) {
        return Err(CampusError::Config(
            "API timeout must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate QR configuration
fn validate_qr_config(config: &super::QrConfig) -> Result<()> {
    if config.debounce_millis == 0 {
        return Err(CampusError::Config(
            "QR debounce interval must be greater than 0".to_string(),
        ));
    }

    if config.max_payload_age_seconds == Some(0) {
        return Err(CampusError::Config(
            "QR payload age window must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(CampusError::Config("Log level is required".to_string()));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(CampusError::Config(format!(
            "Invalid log level: {}. Valid levels: {:?}",
            config.level, valid_levels
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(validate_settings(&Settings::default()).is_ok());
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let mut settings = Settings::default();
        settings.api.base_url = "ftp://campus.example".to_string();
        assert_matches!(validate_settings(&settings), Err(CampusError::Config(_)));
    }

    #[test]
    fn test_rejects_unparseable_base_url() {
        let mut settings = Settings::default();
        settings.api.base_url = "localhost without scheme".to_string();
        assert_matches!(validate_settings(&settings), Err(CampusError::UrlParse(_)));
    }

    #[test]
    fn test_rejects_zero_timeout_and_debounce() {
        let mut settings = Settings::default();
        settings.api.timeout_seconds = Some(0);
        assert!(validate_settings(&settings).is_err());

        let mut settings = Settings::default();
        settings.qr.debounce_millis = 0;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let mut settings = Settings::default();
        settings.logging.level = "verbose".to_string();
        assert_matches!(
            validate_settings(&settings),
            Err(CampusError::Config(msg)) if msg.contains("verbose")
        );
    }
}
