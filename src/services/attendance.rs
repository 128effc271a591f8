//! QR attendance submission
//!
//! Sends a validated scan to the backend. Students check themselves in for
//! an event they are registered for; admins check in a scanned code against
//! the event they have selected.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::QrAttendanceResult;
use crate::services::api::ApiClient;
use crate::services::qr::QrPayload;
use crate::services::stats::Participation;
use crate::utils::errors::{CampusError, Result};
use crate::utils::logging;

pub const NOT_REGISTERED: &str = "You must be registered for this event to mark attendance";
pub const SELECT_EVENT_FIRST: &str = "Please select an event first";

const MAYBE_ALREADY_MARKED: &str = "Attendance may have been already marked";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInMode {
    /// The logged-in student checks in for the scanned event
    SelfService,
    /// An admin checks in scanned codes for the selected event
    Admin { selected_event: Option<i64> },
}

impl fmt::Display for CheckInMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckInMode::SelfService => write!(f, "self-service"),
            CheckInMode::Admin { .. } => write!(f, "admin"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckInOutcome {
    Marked(QrAttendanceResult),
    /// Informational: the backend already had this check-in
    AlreadyMarked(String),
}

impl CheckInOutcome {
    pub fn message(&self) -> &str {
        match self {
            CheckInOutcome::Marked(result) => &result.message,
            CheckInOutcome::AlreadyMarked(message) => message,
        }
    }

    pub fn is_marked(&self) -> bool {
        matches!(self, CheckInOutcome::Marked(_))
    }
}

/// A successful admin check-in, newest first in the desk log
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckInRecord {
    pub attendance_id: i64,
    pub student_name: String,
    pub event_title: String,
    pub checked_in_at: DateTime<Utc>,
}

/// Submits scans and keeps a log of the check-ins made in this session
#[derive(Debug, Clone)]
pub struct CheckInDesk {
    api: ApiClient,
    records: Vec<CheckInRecord>,
}

impl CheckInDesk {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            records: Vec::new(),
        }
    }

    pub fn records(&self) -> &[CheckInRecord] {
        &self.records
    }

    pub async fn submit(
        &mut self,
        mode: CheckInMode,
        payload: &QrPayload,
        participation: &Participation,
    ) -> Result<CheckInOutcome> {
        match mode {
            CheckInMode::SelfService => self.submit_self(payload, participation).await,
            CheckInMode::Admin { selected_event } => {
                self.submit_admin(selected_event, payload).await
            }
        }
    }

    /// Student check-in; refused locally when there is no registration
    pub async fn submit_self(
        &mut self,
        payload: &QrPayload,
        participation: &Participation,
    ) -> Result<CheckInOutcome> {
        let event_id = payload.event_id;
        if !participation.is_registered(event_id) {
            logging::log_attendance(event_id, "self-service", false, NOT_REGISTERED);
            return Err(CampusError::Validation(NOT_REGISTERED.to_string()));
        }

        let response = self.api.mark_student_qr_attendance(event_id).await;
        self.finish(event_id, CheckInMode::SelfService, response)
    }

    /// Admin check-in of a scanned code against the selected event
    pub async fn submit_admin(
        &mut self,
        selected_event: Option<i64>,
        payload: &QrPayload,
    ) -> Result<CheckInOutcome> {
        let event_id = selected_event
            .ok_or_else(|| CampusError::Validation(SELECT_EVENT_FIRST.to_string()))?;

        let qr_data = payload.encode()?;
        let response = self.api.mark_qr_attendance(event_id, &qr_data).await;
        self.finish(event_id, CheckInMode::Admin { selected_event }, response)
    }

    fn finish(
        &mut self,
        event_id: i64,
        mode: CheckInMode,
        response: Result<QrAttendanceResult>,
    ) -> Result<CheckInOutcome> {
        let outcome = classify(response)?;
        logging::log_attendance(
            event_id,
            &mode.to_string(),
            outcome.is_marked(),
            outcome.message(),
        );

        if let (CheckInMode::Admin { .. }, CheckInOutcome::Marked(result)) = (mode, &outcome) {
            if let Some(attendance_id) = result.attendance_id {
                self.records.insert(
                    0,
                    CheckInRecord {
                        attendance_id,
                        student_name: result
                            .student_name
                            .clone()
                            .unwrap_or_else(|| "Unknown Student".to_string()),
                        event_title: result
                            .event_title
                            .clone()
                            .unwrap_or_else(|| "Unknown Event".to_string()),
                        checked_in_at: Utc::now(),
                    },
                );
            }
        }
        Ok(outcome)
    }
}

/// `success: false` and duplicate rejections are informational outcomes
fn classify(response: Result<QrAttendanceResult>) -> Result<CheckInOutcome> {
    match response {
        Ok(result) if result.success => Ok(CheckInOutcome::Marked(result)),
        Ok(result) => {
            let message = if result.message.trim().is_empty() {
                MAYBE_ALREADY_MARKED.to_string()
            } else {
                result.message
            };
            Ok(CheckInOutcome::AlreadyMarked(message))
        }
        Err(CampusError::DuplicateAction(message)) => Ok(CheckInOutcome::AlreadyMarked(message)),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn result(success: bool, message: &str) -> QrAttendanceResult {
        QrAttendanceResult {
            success,
            message: message.to_string(),
            attendance_id: success.then_some(11),
            student_name: None,
            event_title: None,
        }
    }

    #[test]
    fn test_success_is_marked() {
        let outcome = classify(Ok(result(true, "Attendance marked"))).unwrap();
        assert!(outcome.is_marked());
        assert_eq!(outcome.message(), "Attendance marked");
    }

    #[test]
    fn test_unsuccessful_and_duplicate_are_informational() {
        assert_eq!(
            classify(Ok(result(false, "Attendance already marked"))).unwrap(),
            CheckInOutcome::AlreadyMarked("Attendance already marked".to_string())
        );
        assert_eq!(
            classify(Ok(result(false, ""))).unwrap(),
            CheckInOutcome::AlreadyMarked(MAYBE_ALREADY_MARKED.to_string())
        );
        assert_matches!(
            classify(Err(CampusError::DuplicateAction("Already marked".to_string()))),
            Ok(CheckInOutcome::AlreadyMarked(_))
        );
    }

    #[test]
    fn test_other_errors_propagate() {
        assert_matches!(
            classify(Err(CampusError::request(404, Some("Event not found".to_string())))),
            Err(CampusError::Request { status: 404, .. })
        );
    }

    #[tokio::test]
    async fn test_local_refusals_skip_backend() {
        // Unroutable base URL: any backend call would fail with a network error.
        let config = crate::config::ApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        };
        let api = ApiClient::new(&config, crate::state::StateStorage::in_memory()).unwrap();
        let mut desk = CheckInDesk::new(api);
        let payload = QrPayload::bare(7);

        let err = desk.submit_self(&payload, &Participation::default()).await.unwrap_err();
        assert_matches!(err, CampusError::Validation(msg) if msg == NOT_REGISTERED);

        let err = desk
            .submit(
                CheckInMode::Admin { selected_event: None },
                &payload,
                &Participation::default(),
            )
            .await
            .unwrap_err();
        assert_matches!(err, CampusError::Validation(msg) if msg == SELECT_EVENT_FIRST);
        assert!(desk.records().is_empty());
    }
}
