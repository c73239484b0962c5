//! # OtpGate Core
//!
//! Core business logic and domain layer for the OtpGate SMS verification
//! engine. This crate contains the challenge entity and its lifecycle,
//! phone number normalization, repository interfaces, provider seams, and
//! the dispatch/verification services.

pub mod domain;
pub mod errors;
pub mod phone;
pub mod providers;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::entities::challenge::Challenge;
pub use domain::entities::provider_config::ProviderConfig;
pub use errors::{ErrorResponse, OtpError, OtpResult};
pub use providers::{ProviderFactory, SmsProvider, SmsReceipt};
pub use repositories::{ChallengeRepository, ProviderConfigRepository};
pub use services::{
    DispatchConfig, DispatchService, ProviderRegistry, RateLimitConfig, RateLimiter,
    SendOtpResult, VerificationService, VerifyOtpResult,
};
