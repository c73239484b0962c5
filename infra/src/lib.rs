//! # Infrastructure Layer
//!
//! This crate implements the infrastructure layer for the OtpGate engine.
//! It provides the concrete pieces the core wires together: MySQL
//! persistence for challenges and provider configuration, and the SMS
//! gateway adapters behind the core's provider seam.
//!
//! ## Features
//!
//! - `mysql`: MySQL repository implementations (default)
//! - `twilio-sms`: Twilio gateway adapter (default)
//! - `aws-sns`: AWS SNS gateway adapter (default)

/// Database module - MySQL implementations using SQLx
#[cfg(feature = "mysql")]
pub mod database;

/// SMS gateway adapters and the provider factory
pub mod sms;

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection or query error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP request error for external gateways
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// SMS gateway error
    #[error("SMS gateway error: {0}")]
    Sms(String),
}
