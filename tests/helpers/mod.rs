//! Test helpers module
//!
//! This module provides utilities and helpers for testing the campus events
//! client: a mock campus API server, test data builders and basic setup.

#![allow(dead_code)]

pub mod api_mock;
pub mod simple_test;
pub mod test_data;

pub use api_mock::*;
pub use simple_test::*;
pub use test_data::*;
