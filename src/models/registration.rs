//! Registration model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::utils::helpers::flexible_datetime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub id: i64,
    pub student_id: i64,
    pub event_id: i64,
    #[serde(default, with = "flexible_datetime::option")]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRegistrationRequest {
    pub event_id: i64,
}
