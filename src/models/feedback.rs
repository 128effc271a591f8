//! Feedback model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::utils::helpers::flexible_datetime;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: i64,
    pub registration_id: i64,
    pub event_id: i64,
    pub student_id: i64,
    pub rating: u8,
    pub comment: Option<String>,
    #[serde(default, with = "flexible_datetime::option")]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFeedbackRequest {
    pub registration_id: i64,
    pub event_id: i64,
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Response of `GET /events/{id}/average-rating`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageRating {
    #[serde(default)]
    pub event_id: Option<i64>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub total_feedback: Option<u64>,
}

pub fn is_valid_rating(rating: u8) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}
