//! Campus API mocking utilities for testing
//!
//! This module provides a wiremock server standing in for the campus
//! backend, plus shortcuts for wiring clients and contexts to it.

use campus_events::config::{ApiConfig, Settings};
use campus_events::models::{
    Attendance, College, Event, Feedback, QrAttendanceResult, Registration, User,
};
use campus_events::state::{AppContext, StateStorage};
use campus_events::ApiClient;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock campus API server for testing
pub struct CampusMockServer {
    pub server: MockServer,
    pub base_url: String,
}

impl CampusMockServer {
    /// Create a new mock campus API server
    pub async fn new() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();
        Self { server, base_url }
    }

    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url.clone(),
            timeout_seconds: Some(5),
            ..Default::default()
        }
    }

    pub fn settings(&self) -> Settings {
        Settings {
            api: self.api_config(),
            ..Default::default()
        }
    }

    /// API client against this server using `storage` for credentials
    pub fn client(&self, storage: StateStorage) -> ApiClient {
        ApiClient::new(&self.api_config(), storage).expect("client builds")
    }

    /// Application context against this server using `storage` for credentials
    pub fn context(&self, storage: StateStorage) -> AppContext {
        AppContext::with_storage(self.settings(), storage).expect("context builds")
    }

    /// Respond to `verb path` with `status` and a JSON body
    pub async fn mock_json(&self, verb: &str, route: &str, status: u16, body: serde_json::Value) {
        Mock::given(method(verb))
            .and(path(route))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// FastAPI style error: `{"detail": "..."}`
    pub async fn mock_error(&self, verb: &str, route: &str, status: u16, detail: &str) {
        self.mock_json(verb, route, status, json!({ "detail": detail }))
            .await;
    }

    pub async fn mock_login(&self, token: &str) {
        self.mock_json(
            "POST",
            "/auth/login",
            200,
            json!({ "access_token": token, "token_type": "bearer" }),
        )
        .await;
    }

    pub async fn mock_me(&self, user: &User) {
        self.mock_json("GET", "/auth/me", 200, json!(user)).await;
    }

    pub async fn mock_events(&self, events: &[Event]) {
        self.mock_json("GET", "/events", 200, json!(events)).await;
    }

    pub async fn mock_colleges(&self, colleges: &[College]) {
        self.mock_json("GET", "/colleges", 200, json!(colleges)).await;
    }

    /// Mount the five endpoints a student store loads
    pub async fn mock_student_data(
        &self,
        events: &[Event],
        registrations: &[Registration],
        attendances: &[Attendance],
        feedbacks: &[Feedback],
    ) {
        self.mock_events(events).await;
        self.mock_colleges(&[]).await;
        self.mock_json("GET", "/registrations/my", 200, json!(registrations))
            .await;
        self.mock_json("GET", "/attendance/my", 200, json!(attendances))
            .await;
        self.mock_json("GET", "/feedback/my", 200, json!(feedbacks))
            .await;
    }

    /// Mount the six endpoints an admin store loads
    pub async fn mock_admin_data(
        &self,
        events: &[Event],
        registrations: &[Registration],
        attendances: &[Attendance],
        feedbacks: &[Feedback],
        users: &[User],
    ) {
        self.mock_events(events).await;
        self.mock_colleges(&[]).await;
        self.mock_json("GET", "/registrations/all", 200, json!(registrations))
            .await;
        self.mock_json("GET", "/attendance/all", 200, json!(attendances))
            .await;
        self.mock_json("GET", "/feedback/all", 200, json!(feedbacks))
            .await;
        self.mock_json("GET", "/users", 200, json!(users)).await;
    }

    pub async fn mock_student_qr(&self, result: &QrAttendanceResult) {
        self.mock_json("POST", "/attendance/qr/student", 200, json!(result))
            .await;
    }

    pub async fn mock_admin_qr(&self, result: &QrAttendanceResult) {
        self.mock_json("POST", "/attendance/qr", 200, json!(result))
            .await;
    }

    /// Requests the server has seen so far
    pub async fn received(&self) -> Vec<wiremock::Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Reset all mocks
    pub async fn reset(&self) {
        self.server.reset().await;
    }
}

/// Memory storage already holding a valid bearer token
pub async fn storage_with_token(token: &str) -> StateStorage {
    let storage = StateStorage::in_memory();
    storage.save_token(token).await.expect("token saved");
    storage
}
