//! Command handlers module
//!
//! This module contains the terminal view layer: one handler per CLI
//! command, rendering lists, forms and dashboards.

pub mod commands;

// Re-export commonly used handler items
pub use commands::{handle_command, Output};
