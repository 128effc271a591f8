//! Data models module
//!
//! This module contains the data structures exchanged with the campus API

pub mod user;
pub mod college;
pub mod event;
pub mod registration;
pub mod attendance;
pub mod feedback;

// Re-export commonly used models
pub use user::{User, UserRole, RegisterRequest, LoginRequest, Token};
pub use college::{College, CreateCollegeRequest};
pub use event::{Event, EventType, CreateEventRequest, UpdateEventRequest};
pub use registration::{Registration, CreateRegistrationRequest};
pub use attendance::{Attendance, CreateAttendanceRequest, QrAttendanceRequest, QrAttendanceResult};
pub use feedback::{Feedback, CreateFeedbackRequest, AverageRating};
