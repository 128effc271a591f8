//! Services module
//!
//! This module contains the API client and the business logic built on it

pub mod api;
pub mod attendance;
pub mod qr;
pub mod session;
pub mod stats;

// Re-export commonly used services
pub use api::{ApiClient, ApiStatus};
pub use attendance::{CheckInDesk, CheckInMode, CheckInOutcome, CheckInRecord};
pub use qr::{Frame, PayloadValidator, QrFormat, QrPayload};
pub use session::{Session, SessionState, SignupForm};
pub use stats::{EventFilter, EventWithStats, Participation, ReportSummary, StudentWithStats};

use std::sync::Arc;

use crate::config::settings::Settings;
use crate::state::StateStorage;
use crate::utils::errors::Result;

/// Service factory wiring the client, session and QR validation together
#[derive(Debug, Clone)]
pub struct ServiceFactory {
    pub api: ApiClient,
    pub session: Arc<Session>,
    pub validator: PayloadValidator,
}

impl ServiceFactory {
    /// Create a new ServiceFactory sharing one credential storage
    pub fn new(settings: &Settings, storage: StateStorage) -> Result<Self> {
        let api = ApiClient::new(&settings.api, storage)?;
        let session = Arc::new(Session::new(api.clone()));
        let validator = PayloadValidator::from_config(&settings.qr);

        Ok(Self {
            api,
            session,
            validator,
        })
    }

    pub fn check_in_desk(&self) -> CheckInDesk {
        CheckInDesk::new(self.api.clone())
    }

    /// Health check against the backend and the local session
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let api_message = self.api.health().await.ok().map(|status| status.message);

        ServiceHealthStatus {
            api_reachable: api_message.is_some(),
            api_message,
            authenticated: self.session.is_authenticated(),
            freshness_window_secs: self.validator.max_age().map(|d| d.as_secs()),
        }
    }
}

/// Service health status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHealthStatus {
    pub api_reachable: bool,
    pub api_message: Option<String>,
    pub authenticated: bool,
    pub freshness_window_secs: Option<u64>,
}

impl ServiceHealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.api_reachable
    }
}
