//! College model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::utils::helpers::flexible_datetime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct College {
    pub id: i64,
    pub name: String,
    #[serde(default, with = "flexible_datetime::option")]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCollegeRequest {
    pub name: String,
}
