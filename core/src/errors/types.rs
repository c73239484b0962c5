//! Error types for OTP dispatch and verification.
//!
//! Every failure a caller can observe maps to one variant here, with a
//! stable error code for the presentation layer. Provider credentials and
//! raw gateway response bodies never appear in these messages; those are
//! logged server-side only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced by the OTP engine
#[derive(Error, Debug)]
pub enum OtpError {
    /// The input could not be canonicalized to E.164. Client input error,
    /// never retried.
    #[error("Invalid phone number format: {phone}")]
    InvalidPhoneFormat { phone: String },

    /// Too many challenges requested for this phone in the trailing window.
    #[error("Too many verification requests. Please try again in {minutes} minutes")]
    RateLimitExceeded { minutes: u32 },

    /// No active provider is configured for the resolved country. Operator
    /// misconfiguration, fatal until fixed.
    #[error("No SMS provider configured for country: {country}")]
    ConfigNotFound { country: String },

    /// The provider (and its fallback, if any) failed to accept the message.
    #[error("SMS provider unavailable: {provider}")]
    ProviderUnavailable { provider: String },

    /// No eligible challenge exists, or it was already consumed.
    #[error("Verification code has expired or was not found")]
    OtpExpiredOrNotFound,

    /// The supplied code does not match the outstanding challenge.
    #[error("Invalid verification code")]
    OtpMismatch { remaining_attempts: i32 },

    /// The challenge has no attempts left; a new code must be requested.
    #[error("Maximum verification attempts exceeded")]
    MaxAttemptsExceeded,

    /// Persistence-layer failure (connection, query, serialization).
    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl OtpError {
    /// Stable machine-readable code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            OtpError::InvalidPhoneFormat { .. } => "INVALID_PHONE_FORMAT",
            OtpError::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            OtpError::ConfigNotFound { .. } => "CONFIG_NOT_FOUND",
            OtpError::ProviderUnavailable { .. } => "PROVIDER_UNAVAILABLE",
            OtpError::OtpExpiredOrNotFound => "OTP_EXPIRED_OR_NOT_FOUND",
            OtpError::OtpMismatch { .. } => "OTP_MISMATCH",
            OtpError::MaxAttemptsExceeded => "MAX_ATTEMPTS_EXCEEDED",
            OtpError::Storage { .. } => "STORAGE_ERROR",
        }
    }
}

/// Unified error response structure for the route layer
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Timestamp when the error occurred
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(error: impl ToString, message: impl ToString) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            timestamp: Utc::now(),
        }
    }
}

impl From<OtpError> for ErrorResponse {
    fn from(err: OtpError) -> Self {
        ErrorResponse::new(err.error_code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        let err = OtpError::InvalidPhoneFormat {
            phone: "abc".to_string(),
        };
        assert_eq!(err.error_code(), "INVALID_PHONE_FORMAT");

        let err = OtpError::ConfigNotFound {
            country: "LK".to_string(),
        };
        assert_eq!(err.error_code(), "CONFIG_NOT_FOUND");

        let err = OtpError::OtpMismatch {
            remaining_attempts: 2,
        };
        assert_eq!(err.error_code(), "OTP_MISMATCH");
    }

    #[test]
    fn test_error_response_conversion() {
        let err = OtpError::RateLimitExceeded { minutes: 60 };
        let response: ErrorResponse = err.into();
        assert_eq!(response.error, "RATE_LIMIT_EXCEEDED");
        assert!(response.message.contains("60 minutes"));
    }

    #[test]
    fn test_messages_do_not_leak_provider_detail() {
        let err = OtpError::ProviderUnavailable {
            provider: "vonage".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("vonage"));
        assert!(!message.contains("http"));
    }
}
