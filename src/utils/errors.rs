//! Error handling for the campus events client
//!
//! This module defines the main error type used throughout the crate
//! and provides a unified error handling strategy for API calls, the
//! auth session and the QR attendance workflow.

use thiserror::Error;

/// Main error type for campus events operations
#[derive(Error, Debug)]
pub enum CampusError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request failed ({status}): {detail}")]
    Request { status: u16, detail: String },

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid QR payload: {0}")]
    InvalidPayload(String),

    #[error("{0}")]
    DuplicateAction(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("QR encoding error: {0}")]
    QrEncode(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Credential storage error: {0}")]
    Storage(String),
}

/// Result type alias for campus events operations
pub type Result<T> = std::result::Result<T, CampusError>;

impl From<config::ConfigError> for CampusError {
    fn from(err: config::ConfigError) -> Self {
        CampusError::Config(err.to_string())
    }
}

impl From<qrcode::types::QrError> for CampusError {
    fn from(err: qrcode::types::QrError) -> Self {
        CampusError::QrEncode(err.to_string())
    }
}

impl CampusError {
    /// Build a request error from an HTTP status and optional server detail
    pub fn request(status: u16, detail: Option<String>) -> Self {
        CampusError::Request {
            status,
            detail: detail.unwrap_or_else(|| format!("Request failed with status {}", status)),
        }
    }

    /// Already-registered / already-attended / already-rated outcomes are shown
    /// to the user but do not block anything.
    pub fn is_informational(&self) -> bool {
        matches!(self, CampusError::DuplicateAction(_))
    }

    /// Whether the error ended the authenticated session
    pub fn is_session_ending(&self) -> bool {
        matches!(self, CampusError::Authentication(_))
    }

    /// Message suitable for a banner in the view layer
    pub fn user_message(&self) -> String {
        match self {
            CampusError::Request { detail, .. } => detail.clone(),
            CampusError::Authentication(detail)
            | CampusError::PermissionDenied(detail)
            | CampusError::Validation(detail)
            | CampusError::DuplicateAction(detail) => detail.clone(),
            CampusError::InvalidPayload(detail) => {
                format!("Invalid QR code format: {}", detail)
            }
            CampusError::Network(_) => "Unable to reach the server".to_string(),
            other => other.to_string(),
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            CampusError::Config(_) => ErrorSeverity::Critical,
            CampusError::Storage(_) => ErrorSeverity::Critical,
            CampusError::Authentication(_) => ErrorSeverity::Warning,
            CampusError::PermissionDenied(_) => ErrorSeverity::Warning,
            CampusError::Validation(_) => ErrorSeverity::Info,
            CampusError::InvalidPayload(_) => ErrorSeverity::Info,
            CampusError::DuplicateAction(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_error_uses_fallback_detail() {
        let err = CampusError::request(500, None);
        assert_eq!(err.user_message(), "Request failed with status 500");
    }

    #[test]
    fn test_request_error_keeps_server_detail() {
        let err = CampusError::request(404, Some("Event not found".to_string()));
        assert_eq!(err.user_message(), "Event not found");
        assert_eq!(err.to_string(), "Request failed (404): Event not found");
    }

    #[test]
    fn test_duplicate_action_is_informational() {
        let err = CampusError::DuplicateAction("Already registered for this event".to_string());
        assert!(err.is_informational());
        assert_eq!(err.severity(), ErrorSeverity::Info);
        assert!(!CampusError::Validation("x".to_string()).is_informational());
    }

    #[test]
    fn test_authentication_ends_session() {
        assert!(CampusError::Authentication("expired".to_string()).is_session_ending());
        assert!(!CampusError::request(403, None).is_session_ending());
    }
}
