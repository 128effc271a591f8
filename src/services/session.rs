//! Authentication session
//!
//! Holds the current user and token for the lifetime of the client. The
//! session starts in `Loading`, is populated from credential storage by
//! `initialize`, and is mutated only by `login`, `register` and `logout`.
//! It is passed explicitly to whoever needs it; there is no global instance.

use std::fmt;
use std::sync::RwLock;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::models::{LoginRequest, RegisterRequest, User, UserRole};
use crate::services::api::ApiClient;
use crate::utils::errors::{CampusError, Result};
use crate::utils::helpers::{is_token_expired, is_valid_email};

/// Shortest password accepted before the signup request is sent
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone, PartialEq)]
pub enum SessionState {
    Loading,
    Anonymous,
    Authenticated { user: User, token: String },
}

// The token never reaches logs.
impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Loading => write!(f, "Loading"),
            SessionState::Anonymous => write!(f, "Anonymous"),
            SessionState::Authenticated { user, .. } => f
                .debug_struct("Authenticated")
                .field("user_id", &user.id)
                .field("role", &user.role)
                .finish_non_exhaustive(),
        }
    }
}

/// Signup form as entered by the user
#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Option<UserRole>,
    pub college_id: Option<i64>,
}

impl SignupForm {
    /// Client-side checks run before anything is sent
    pub fn validate(&self) -> Result<()> {
        if self.full_name.trim().is_empty()
            || self.email.trim().is_empty()
            || self.password.is_empty()
        {
            return Err(CampusError::Validation("All fields are required".to_string()));
        }
        if !is_valid_email(self.email.trim()) {
            return Err(CampusError::Validation(format!(
                "Invalid email address: {}",
                self.email.trim()
            )));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(CampusError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }

    fn to_request(&self) -> RegisterRequest {
        RegisterRequest {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            full_name: self.full_name.trim().to_string(),
            role: self.role.unwrap_or_default(),
            college_id: self.college_id,
        }
    }
}

/// Authentication session for the current process
#[derive(Debug)]
pub struct Session {
    api: ApiClient,
    state: RwLock<SessionState>,
}

impl Session {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: RwLock::new(SessionState::Loading),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn state(&self) -> SessionState {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set_state(&self, state: SessionState) {
        *self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state(), SessionState::Loading)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state(), SessionState::Authenticated { .. })
    }

    pub fn current_user(&self) -> Option<User> {
        match self.state() {
            SessionState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn token(&self) -> Option<String> {
        match self.state() {
            SessionState::Authenticated { token, .. } => Some(token),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.current_user().map(|u| u.is_admin()).unwrap_or(false)
    }

    /// The logged-in user, or an authentication error
    pub fn require_user(&self) -> Result<User> {
        self.current_user()
            .ok_or_else(|| CampusError::Authentication("Please log in first".to_string()))
    }

    /// The logged-in admin, or a permission error
    pub fn require_admin(&self) -> Result<User> {
        let user = self.require_user()?;
        if !user.is_admin() {
            return Err(CampusError::PermissionDenied(
                "This action requires an admin account".to_string(),
            ));
        }
        Ok(user)
    }

    /// Restore the session from storage.
    ///
    /// Any failure leaves the session anonymous; a cached profile is never
    /// used in place of a fresh `/auth/me` answer.
    pub async fn initialize(&self) -> SessionState {
        self.set_state(SessionState::Loading);

        let token = match self.api.storage().token().await {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Could not read stored credentials");
                None
            }
        };

        let Some(token) = token else {
            debug!("No stored token, starting anonymous");
            self.set_state(SessionState::Anonymous);
            return SessionState::Anonymous;
        };

        if is_token_expired(&token, Utc::now()) {
            info!("Stored token has expired, clearing it");
            if let Err(e) = self.api.storage().clear().await {
                warn!(error = %e, "Failed to clear expired credentials");
            }
            self.set_state(SessionState::Anonymous);
            return SessionState::Anonymous;
        }

        let state = match self.api.current_user().await {
            Ok(user) => {
                if let Err(e) = self.api.storage().save_user(&user).await {
                    warn!(error = %e, "Failed to cache user profile");
                }
                debug!(user_id = user.id, "Session restored");
                SessionState::Authenticated { user, token }
            }
            Err(e) => {
                warn!(error = %e, "Could not restore session, continuing anonymous");
                SessionState::Anonymous
            }
        };

        self.set_state(state.clone());
        state
    }

    /// Exchange credentials for a token, persist it and load the profile
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(CampusError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let token = self
            .api
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await
            .map_err(into_auth_error)?;

        let storage = self.api.storage();
        storage.save_token(&token.access_token).await?;

        let user = match self.api.current_user().await {
            Ok(user) => user,
            Err(e) => {
                storage.clear().await?;
                self.set_state(SessionState::Anonymous);
                return Err(into_auth_error(e));
            }
        };
        storage.save_user(&user).await?;

        info!(user_id = user.id, role = %user.role, "Logged in");
        self.set_state(SessionState::Authenticated {
            user: user.clone(),
            token: token.access_token,
        });
        Ok(user)
    }

    /// Create an account, then log in with the same credentials
    pub async fn register(&self, form: &SignupForm) -> Result<User> {
        form.validate()?;

        let created = self
            .api
            .register(&form.to_request())
            .await
            .map_err(into_auth_error)?;
        info!(user_id = created.id, "Account created");

        self.login(&form.email, &form.password).await
    }

    /// Forget the stored credentials; the backend is not contacted
    pub async fn logout(&self) -> Result<()> {
        let result = self.api.storage().clear().await;
        self.set_state(SessionState::Anonymous);
        info!("Logged out");
        result
    }

    /// Drop to anonymous if the stored token disappeared (e.g. after a 401).
    ///
    /// Returns `true` when the session changed.
    pub async fn sync_with_storage(&self) -> bool {
        if !self.is_authenticated() {
            return false;
        }
        match self.api.storage().token().await {
            Ok(Some(_)) => false,
            _ => {
                info!("Stored credentials are gone, session ended");
                self.set_state(SessionState::Anonymous);
                true
            }
        }
    }
}

/// Backend rejections of credentials or signup payloads are auth errors
fn into_auth_error(error: CampusError) -> CampusError {
    match error {
        CampusError::Request { status, detail } if (400..500).contains(&status) => {
            CampusError::Authentication(detail)
        }
        CampusError::DuplicateAction(detail) => CampusError::Authentication(detail),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn form() -> SignupForm {
        SignupForm {
            email: "ravi@campus.edu".to_string(),
            password: "secret123".to_string(),
            full_name: "Ravi Kumar".to_string(),
            role: None,
            college_id: Some(2),
        }
    }

    #[test]
    fn test_signup_form_requires_all_fields() {
        let mut missing_name = form();
        missing_name.full_name = "  ".to_string();
        assert_matches!(
            missing_name.validate(),
            Err(CampusError::Validation(msg)) if msg == "All fields are required"
        );

        let mut missing_password = form();
        missing_password.password.clear();
        assert!(missing_password.validate().is_err());
    }

    #[test]
    fn test_signup_form_checks_email_and_password() {
        let mut bad_email = form();
        bad_email.email = "ravi".to_string();
        assert_matches!(bad_email.validate(), Err(CampusError::Validation(_)));

        let mut short = form();
        short.password = "abc".to_string();
        assert_matches!(
            short.validate(),
            Err(CampusError::Validation(msg)) if msg.contains("at least")
        );

        assert!(form().validate().is_ok());
    }

    #[test]
    fn test_signup_defaults_to_student_role() {
        let request = form().to_request();
        assert_eq!(request.role, UserRole::Student);
        assert_eq!(request.college_id, Some(2));
    }

    #[test]
    fn test_debug_hides_token() {
        let state = SessionState::Authenticated {
            user: crate::models::User {
                id: 9,
                email: "x@campus.edu".to_string(),
                full_name: "X".to_string(),
                role: UserRole::Student,
                college_id: None,
                is_active: true,
                created_at: None,
                updated_at: None,
            },
            token: "secret-token".to_string(),
        };
        let printed = format!("{:?}", state);
        assert!(printed.contains("user_id: 9"));
        assert!(!printed.contains("secret-token"));
    }

    #[test]
    fn test_rejections_become_auth_errors() {
        let err = into_auth_error(CampusError::request(
            400,
            Some("Email already registered".to_string()),
        ));
        assert_matches!(err, CampusError::Authentication(msg) if msg == "Email already registered");

        let err = into_auth_error(CampusError::request(502, None));
        assert_matches!(err, CampusError::Request { status: 502, .. });
    }
}
