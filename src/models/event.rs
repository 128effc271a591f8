//! Event model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::utils::helpers::flexible_datetime;

/// Event category. The backend stores it as a free string, so decoding goes
/// through the case-insensitive `FromStr` below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum EventType {
    Workshop,
    Fest,
    Seminar,
    Conference,
    Sports,
    Cultural,
}

impl EventType {
    pub const ALL: [EventType; 6] = [
        EventType::Workshop,
        EventType::Fest,
        EventType::Seminar,
        EventType::Conference,
        EventType::Sports,
        EventType::Cultural,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Workshop => "Workshop",
            EventType::Fest => "Fest",
            EventType::Seminar => "Seminar",
            EventType::Conference => "Conference",
            EventType::Sports => "Sports",
            EventType::Cultural => "Cultural",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown event type: {}", s))
    }
}

impl TryFrom<String> for EventType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(with = "flexible_datetime")]
    pub date: NaiveDateTime,
    pub location: Option<String>,
    pub max_attendees: Option<i32>,
    pub college_id: i64,
    pub created_by: Option<i64>,
    #[serde(default, with = "flexible_datetime::option")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, with = "flexible_datetime::option")]
    pub updated_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub average_rating: Option<f64>,
}

impl Event {
    /// Whether `registrations` already fills the capacity, if one is set
    pub fn is_full(&self, registrations: usize) -> bool {
        self.max_attendees
            .map(|max| max >= 0 && registrations >= max as usize)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(with = "flexible_datetime")]
    pub date: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attendees: Option<i32>,
    pub college_id: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "flexible_datetime::option"
    )]
    pub date: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attendees: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub college_id: Option<i64>,
}

impl UpdateEventRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.event_type.is_none()
            && self.date.is_none()
            && self.location.is_none()
            && self.max_attendees.is_none()
            && self.college_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_deserializes_backend_shape() {
        let json = r#"{
            "id": 7, "title": "Rust Workshop", "description": null, "type": "Workshop",
            "date": "2024-09-01T14:00:00", "location": "Hall A", "max_attendees": 40,
            "college_id": 2, "created_by": 1,
            "created_at": "2024-08-01T09:00:00.512345", "updated_at": "2024-08-01T09:00:00",
            "average_rating": null
        }"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.id, 7);
        assert_eq!(event.event_type, EventType::Workshop);
        assert_eq!(event.max_attendees, Some(40));
        assert!(event.average_rating.is_none());
    }

    #[test]
    fn test_event_type_parsing_is_case_insensitive() {
        assert_eq!("seminar".parse::<EventType>(), Ok(EventType::Seminar));
        assert_eq!(" CULTURAL ".parse::<EventType>(), Ok(EventType::Cultural));
        assert!("Party".parse::<EventType>().is_err());
    }

    #[test]
    fn test_event_type_decodes_any_case() {
        let json = r#"{"id":3,"title":"t","description":null,"type":"workshop",
            "date":"2024-01-01T00:00:00","location":null,"max_attendees":null,"college_id":1,
            "created_by":1}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_type, EventType::Workshop);
        assert_eq!(serde_json::to_value(event.event_type).unwrap(), "Workshop");

        let decoded: EventType = serde_json::from_str(r#""FEST""#).unwrap();
        assert_eq!(decoded, EventType::Fest);
    }

    #[test]
    fn test_unknown_event_type_names_the_value() {
        let err = serde_json::from_str::<EventType>(r#""Party""#).unwrap_err();
        assert!(err.to_string().contains("unknown event type: Party"));
    }

    #[test]
    fn test_update_request_skips_unset_fields() {
        let update = UpdateEventRequest {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&update).unwrap();
        assert_eq!(value, serde_json::json!({ "title": "Renamed" }));
        assert!(!update.is_empty());
        assert!(UpdateEventRequest::default().is_empty());
    }

    #[test]
    fn test_capacity() {
        let json = r#"{"id":1,"title":"t","description":null,"type":"Fest",
            "date":"2024-01-01T00:00:00",
            "location":null,"max_attendees":2,"college_id":1,"created_by":1}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert!(!event.is_full(1));
        assert!(event.is_full(2));
    }
}
