//! Domain-specific error types and error handling.

mod types;

// Re-export all error types and utilities
pub use types::{ErrorResponse, OtpError};

/// Convenient result alias for core operations
pub type OtpResult<T> = Result<T, OtpError>;
