//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the campus events client.

use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use crate::config::LoggingConfig;
use crate::utils::errors::{CampusError, Result};

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file appender on drop and must be kept alive
/// for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    let stderr_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let (file_layer, guard) = match &config.file_path {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "campus-events.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CampusError::Config(format!("Failed to initialize logging: {}", e)))?;

    debug!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log user actions with structured data
pub fn log_user_action(user_id: Option<i64>, action: &str, details: Option<&str>) {
    info!(
        user_id = user_id,
        action = action,
        details = details,
        "User action performed"
    );
}

/// Log event management actions
pub fn log_event_action(event_id: i64, action: &str, user_id: Option<i64>) {
    info!(
        event_id = event_id,
        action = action,
        user_id = user_id,
        "Event action performed"
    );
}

/// Log attendance check-ins and their outcome
pub fn log_attendance(event_id: i64, mode: &str, marked: bool, message: &str) {
    if marked {
        info!(event_id = event_id, mode = mode, message = message, "Attendance marked");
    } else {
        warn!(event_id = event_id, mode = mode, message = message, "Attendance not marked");
    }
}

/// Log API errors with context
pub fn log_api_error(endpoint: &str, error: &CampusError) {
    match error.severity() {
        crate::utils::errors::ErrorSeverity::Info => {
            debug!(endpoint = endpoint, error = %error, "API call rejected")
        }
        crate::utils::errors::ErrorSeverity::Warning => {
            warn!(endpoint = endpoint, error = %error, "API call rejected")
        }
        _ => error!(endpoint = endpoint, error = %error, "API error occurred"),
    }
}
