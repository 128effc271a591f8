//! Simple test infrastructure for basic testing
//!
//! This provides a minimal test setup that works without a backend

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize test environment
pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Simple test context holding a scratch directory
pub struct SimpleTestContext {
    pub temp_dir: tempfile::TempDir,
}

impl SimpleTestContext {
    /// Create a new simple test context
    pub fn new() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        init_test_env();
        Ok(Self {
            temp_dir: tempfile::tempdir()?,
        })
    }

    /// Get temp directory path
    pub fn temp_path(&self) -> &std::path::Path {
        self.temp_dir.path()
    }
}
