//! Application context
//!
//! Everything a command needs: settings, the shared session and the
//! factories for per-screen state.

use std::sync::Arc;

use crate::config::Settings;
use crate::services::{ApiClient, CheckInDesk, ServiceFactory, Session};
use crate::state::scanner::ScanSession;
use crate::state::storage::StateStorage;
use crate::state::store::{DataScope, EventStore};
use crate::utils::errors::Result;

/// Application-wide context containing services and settings
#[derive(Debug, Clone)]
pub struct AppContext {
    pub settings: Settings,
    pub services: ServiceFactory,
}

impl AppContext {
    /// Context backed by the credential file named in the settings
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let storage = StateStorage::file(settings.credentials_path());
        Self::with_storage(settings, storage)
    }

    pub fn with_storage(settings: Settings, storage: StateStorage) -> Result<Self> {
        let services = ServiceFactory::new(&settings, storage)?;
        Ok(Self { settings, services })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.services.session
    }

    pub fn api(&self) -> &ApiClient {
        &self.services.api
    }

    /// Store for the logged-in user, reading the endpoints their role allows
    pub fn open_store(&self) -> Result<EventStore> {
        let user = self.session().require_user()?;
        Ok(EventStore::new(self.api().clone(), DataScope::for_user(&user)))
    }

    pub fn scan_session(&self) -> ScanSession {
        ScanSession::from_config(&self.settings.qr)
    }

    pub fn check_in_desk(&self) -> CheckInDesk {
        self.services.check_in_desk()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::errors::CampusError;
    use assert_matches::assert_matches;

    #[test]
    fn test_store_requires_login() {
        let context =
            AppContext::with_storage(Settings::default(), StateStorage::in_memory()).unwrap();
        assert_matches!(context.open_store(), Err(CampusError::Authentication(_)));
    }

    #[test]
    fn test_scan_session_uses_configured_debounce() {
        let mut settings = Settings::default();
        settings.qr.debounce_millis = 500;
        let context = AppContext::with_storage(settings, StateStorage::in_memory()).unwrap();
        assert_eq!(context.scan_session().debounce().as_millis(), 500);
    }
}
