//! Campus Events
//!
//! Client for a campus event management platform. This library provides
//! the API client, an explicitly scoped auth session, statistics over
//! registrations, attendance and feedback, the QR attendance workflow and
//! a terminal view layer used by the `campus` binary.

pub mod cli;
pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{CampusError, Result};

// Re-export main components for easy access
pub use services::{ApiClient, ServiceFactory, Session};
pub use state::{AppContext, EventStore, StateStorage};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
