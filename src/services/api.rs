//! Campus API client
//!
//! Thin wrapper over the backend's HTTP JSON API: one method per endpoint,
//! bearer token attached from credential storage, and 401 responses
//! normalized by clearing the stored credentials. Calls are fire-once: no
//! retries, no backoff, no request deduplication.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, debug_span, warn, Instrument};
use url::Url;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::models::{
    Attendance, AverageRating, College, CreateAttendanceRequest, CreateCollegeRequest,
    CreateEventRequest, CreateFeedbackRequest, CreateRegistrationRequest, Event, Feedback,
    LoginRequest, QrAttendanceRequest, QrAttendanceResult, RegisterRequest, Registration, Token,
    UpdateEventRequest, User,
};
use crate::state::StateStorage;
use crate::utils::errors::{CampusError, Result};
use crate::utils::logging;

/// Header carrying the per-request correlation id
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Default page used by `list_events`
pub const DEFAULT_EVENT_LIMIT: u32 = 100;

const SESSION_EXPIRED: &str = "Session expired. Please log in again";

/// FastAPI error body: `detail` is a string, or a list of validation issues
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<Value>,
}

/// HTTP client for the campus API
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    storage: StateStorage,
}

impl ApiClient {
    /// Create a new ApiClient instance
    pub fn new(config: &ApiConfig, storage: StateStorage) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(CampusError::Network)?;
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))?;

        Ok(Self {
            client,
            base_url,
            storage,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn storage(&self) -> &StateStorage {
        &self.storage
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{}{}", base, path))?)
    }

    /// Start a request, attaching the bearer token when one is stored
    async fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let mut builder = self.client.request(method, self.endpoint(path)?);
        if let Some(token) = self.storage.token().await? {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: &Method,
        path: &str,
        builder: RequestBuilder,
    ) -> Result<T> {
        let request_id = Uuid::new_v4();
        let span = debug_span!(
            "api_request",
            method = %method,
            path = path,
            request_id = %request_id
        );

        let result = async {
            let response = builder
                .header(REQUEST_ID_HEADER, request_id.to_string())
                .send()
                .await
                .map_err(CampusError::Network)?;
            self.handle_response(response).await
        }
        .instrument(span)
        .await;

        if let Err(ref e) = result {
            logging::log_api_error(path, e);
        }
        result
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let status = response.status();
        debug!(status = status.as_u16(), "Response received");

        if status == StatusCode::UNAUTHORIZED {
            let detail = read_detail(response).await;
            warn!("Received 401, clearing stored credentials");
            if let Err(e) = self.storage.clear().await {
                warn!(error = %e, "Failed to clear stored credentials");
            }
            return Err(CampusError::Authentication(
                detail.unwrap_or_else(|| SESSION_EXPIRED.to_string()),
            ));
        }

        if !status.is_success() {
            let detail = read_detail(response).await;
            return Err(classify_failure(status, detail));
        }

        let bytes = response.bytes().await.map_err(CampusError::Network)?;
        if bytes.is_empty() {
            return Ok(serde_json::from_slice(b"null")?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let builder = self.request(Method::GET, path).await?;
        self.execute(&Method::GET, path, builder).await
    }

    async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T> {
        let builder = self.request(Method::GET, path).await?.query(query);
        self.execute(&Method::GET, path, builder).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let builder = self.request(Method::POST, path).await?.json(body);
        self.execute(&Method::POST, path, builder).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let builder = self.request(Method::PUT, path).await?.json(body);
        self.execute(&Method::PUT, path, builder).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let builder = self.request(Method::DELETE, path).await?;
        self.execute(&Method::DELETE, path, builder).await
    }
}

/// Pull a human-readable reason out of an error response
async fn read_detail(response: Response) -> Option<String> {
    let text = response.text().await.ok()?;
    let body: ErrorBody = serde_json::from_str(&text).ok()?;
    match body.detail? {
        Value::String(detail) if !detail.trim().is_empty() => Some(detail),
        Value::Array(issues) => {
            let messages: Vec<String> = issues
                .iter()
                .filter_map(|issue| issue.get("msg").and_then(Value::as_str))
                .map(str::to_string)
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}

fn classify_failure(status: StatusCode, detail: Option<String>) -> CampusError {
    match detail {
        Some(detail)
            if status == StatusCode::BAD_REQUEST
                && detail.trim_start().to_ascii_lowercase().starts_with("already") =>
        {
            CampusError::DuplicateAction(detail)
        }
        detail => CampusError::request(status.as_u16(), detail),
    }
}

/// Body of `GET /`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiStatus {
    #[serde(default)]
    pub message: String,
}

impl ApiClient {
    /// Liveness probe against the API root
    pub async fn health(&self) -> Result<ApiStatus> {
        self.get("/").await
    }
}

// Auth endpoints
impl ApiClient {
    pub async fn register(&self, request: &RegisterRequest) -> Result<User> {
        self.post("/auth/register", request).await
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<Token> {
        self.post("/auth/login", request).await
    }

    pub async fn current_user(&self) -> Result<User> {
        self.get("/auth/me").await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.get("/users").await
    }
}

// College endpoints
impl ApiClient {
    pub async fn list_colleges(&self) -> Result<Vec<College>> {
        self.get("/colleges").await
    }

    pub async fn create_college(&self, name: &str) -> Result<College> {
        self.post(
            "/colleges",
            &CreateCollegeRequest {
                name: name.to_string(),
            },
        )
        .await
    }
}

// Event endpoints
impl ApiClient {
    pub async fn list_events(&self, skip: u32, limit: u32) -> Result<Vec<Event>> {
        self.get_with_query("/events", &[("skip", skip), ("limit", limit)])
            .await
    }

    pub async fn get_event(&self, event_id: i64) -> Result<Event> {
        self.get(&format!("/events/{}", event_id)).await
    }

    pub async fn create_event(&self, request: &CreateEventRequest) -> Result<Event> {
        self.post("/events", request).await
    }

    pub async fn update_event(&self, event_id: i64, request: &UpdateEventRequest) -> Result<Event> {
        self.put(&format!("/events/{}", event_id), request).await
    }

    pub async fn delete_event(&self, event_id: i64) -> Result<()> {
        let _: Value = self.delete(&format!("/events/{}", event_id)).await?;
        Ok(())
    }
}

// Registration endpoints
impl ApiClient {
    pub async fn create_registration(&self, event_id: i64) -> Result<Registration> {
        self.post("/registrations", &CreateRegistrationRequest { event_id })
            .await
    }

    pub async fn my_registrations(&self) -> Result<Vec<Registration>> {
        self.get("/registrations/my").await
    }

    pub async fn all_registrations(&self) -> Result<Vec<Registration>> {
        self.get("/registrations/all").await
    }
}

// Attendance endpoints
impl ApiClient {
    pub async fn create_attendance(
        &self,
        registration_id: i64,
        event_id: i64,
    ) -> Result<Attendance> {
        self.post(
            "/attendance",
            &CreateAttendanceRequest {
                registration_id,
                event_id,
            },
        )
        .await
    }

    /// Admin check-in of a scanned student code
    pub async fn mark_qr_attendance(
        &self,
        event_id: i64,
        qr_data: &str,
    ) -> Result<QrAttendanceResult> {
        self.post(
            "/attendance/qr",
            &QrAttendanceRequest {
                event_id,
                qr_data: qr_data.to_string(),
            },
        )
        .await
    }

    /// Self-service check-in for the logged-in student
    pub async fn mark_student_qr_attendance(&self, event_id: i64) -> Result<QrAttendanceResult> {
        let path = "/attendance/qr/student";
        let builder = self
            .request(Method::POST, path)
            .await?
            .query(&[("event_id", event_id)]);
        self.execute(&Method::POST, path, builder).await
    }

    pub async fn my_attendance(&self) -> Result<Vec<Attendance>> {
        self.get("/attendance/my").await
    }

    pub async fn all_attendance(&self) -> Result<Vec<Attendance>> {
        self.get("/attendance/all").await
    }
}

// Feedback endpoints
impl ApiClient {
    pub async fn create_feedback(&self, request: &CreateFeedbackRequest) -> Result<Feedback> {
        self.post("/feedback", request).await
    }

    pub async fn my_feedback(&self) -> Result<Vec<Feedback>> {
        self.get("/feedback/my").await
    }

    pub async fn all_feedback(&self) -> Result<Vec<Feedback>> {
        self.get("/feedback/all").await
    }

    pub async fn event_feedback(&self, event_id: i64) -> Result<Vec<Feedback>> {
        self.get(&format!("/events/{}/feedback", event_id)).await
    }

    pub async fn event_average_rating(&self, event_id: i64) -> Result<AverageRating> {
        self.get(&format!("/events/{}/average-rating", event_id))
            .await
    }
}
