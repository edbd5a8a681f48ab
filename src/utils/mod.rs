//! Utility modules for configuration, error handling, and duration math.

pub mod config;
pub mod duration;
pub mod error;

// Re-export commonly used error types for convenience
pub use error::{DecodeError, FlamegraphError, OutputError, SessionError};
