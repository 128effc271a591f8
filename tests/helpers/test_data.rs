//! Test data helpers for creating test objects
//!
//! Builders for the entities the campus API returns.

use campus_events::models::{
    Attendance, College, Event, EventType, Feedback, QrAttendanceResult, Registration, User,
    UserRole,
};
use chrono::{NaiveDate, NaiveDateTime};

pub const TEST_PASSWORD: &str = "campus-secret";

pub fn test_time(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 9, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .expect("valid test date")
}

/// Helper function to create a test user
pub fn create_test_user(id: i64, role: UserRole) -> User {
    User {
        id,
        email: format!("user{}@campus.edu", id),
        full_name: format!("Test User {}", id),
        role,
        college_id: Some(1),
        is_active: true,
        created_at: Some(test_time(1, 9)),
        updated_at: None,
    }
}

pub fn create_test_student(id: i64) -> User {
    create_test_user(id, UserRole::Student)
}

pub fn create_test_admin(id: i64) -> User {
    create_test_user(id, UserRole::Admin)
}

pub fn create_test_college(id: i64, name: &str) -> College {
    College {
        id,
        name: name.to_string(),
        created_at: None,
    }
}

/// Helper function to create a test event
pub fn create_test_event(id: i64, title: &str, event_type: EventType) -> Event {
    Event {
        id,
        title: title.to_string(),
        description: Some(format!("About {}", title)),
        event_type,
        date: test_time(10, 14),
        location: Some("Main Hall".to_string()),
        max_attendees: Some(50),
        college_id: 1,
        created_by: Some(1),
        created_at: Some(test_time(1, 9)),
        updated_at: None,
        average_rating: None,
    }
}

pub fn create_test_registration(id: i64, student_id: i64, event_id: i64) -> Registration {
    Registration {
        id,
        student_id,
        event_id,
        created_at: Some(test_time(2, 10)),
    }
}

pub fn create_test_attendance(id: i64, registration: &Registration) -> Attendance {
    Attendance {
        id,
        registration_id: registration.id,
        event_id: registration.event_id,
        student_id: registration.student_id,
        check_in_time: Some(test_time(10, 14)),
    }
}

pub fn create_test_feedback(id: i64, registration: &Registration, rating: u8) -> Feedback {
    Feedback {
        id,
        registration_id: registration.id,
        event_id: registration.event_id,
        student_id: registration.student_id,
        rating,
        comment: Some("Well organised".to_string()),
        created_at: Some(test_time(11, 9)),
    }
}

pub fn create_qr_result(success: bool, message: &str) -> QrAttendanceResult {
    QrAttendanceResult {
        success,
        message: message.to_string(),
        attendance_id: success.then_some(501),
        student_name: success.then(|| "Test User 100".to_string()),
        event_title: success.then(|| "Rust Workshop".to_string()),
    }
}

/// A structurally valid JWT expiring at `exp` (seconds since epoch)
pub fn jwt_expiring_at(exp: i64) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    #[derive(serde::Serialize)]
    struct Claims {
        sub: String,
        exp: i64,
    }

    encode(
        &Header::default(),
        &Claims {
            sub: "user100@campus.edu".to_string(),
            exp,
        },
        &EncodingKey::from_secret(b"test-secret"),
    )
    .expect("token encodes")
}

pub fn fresh_jwt() -> String {
    jwt_expiring_at(chrono::Utc::now().timestamp() + 3600)
}
