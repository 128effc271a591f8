//! Attendance models, including QR check-in results

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::utils::helpers::flexible_datetime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendance {
    pub id: i64,
    pub registration_id: i64,
    pub event_id: i64,
    pub student_id: i64,
    #[serde(default, with = "flexible_datetime::option")]
    pub check_in_time: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAttendanceRequest {
    pub registration_id: i64,
    pub event_id: i64,
}

/// Payload for `POST /attendance/qr`, sent when an admin scans a student
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrAttendanceRequest {
    pub event_id: i64,
    pub qr_data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrAttendanceResult {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub attendance_id: Option<i64>,
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub event_title: Option<String>,
}
