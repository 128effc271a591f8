//! State management module
//!
//! This module handles credentials, the per-screen event store and QR scan sessions

pub mod context;
pub mod scanner;
pub mod storage;
pub mod store;

// Re-export commonly used state components
pub use context::AppContext;
pub use scanner::{ScanSession, ScanState};
pub use storage::{CredentialStore, FileCredentialStore, MemoryCredentialStore, StateStorage};
pub use store::{DataScope, EventStore, StoreHandle};
