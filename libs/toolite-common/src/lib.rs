//! Toolite common library
//!
//! Error type, layered configuration loading and logging setup shared by the
//! timing, helper and facade crates.

pub mod config;
pub mod error;
pub mod logging;

// Re-exports for convenience
pub use error::{Error, Result};
pub use logging::{init_logging, init_test_logging, LogConfig, LogConfigBuilder, LogFormat};

