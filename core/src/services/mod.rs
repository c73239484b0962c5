//! Business services for OTP dispatch and verification.

pub mod dispatch;
pub mod rate_limit;
pub mod registry;
pub mod verification;

pub use dispatch::{DispatchConfig, DispatchService, SendOtpResult};
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use registry::ProviderRegistry;
pub use verification::{VerificationService, VerifyOtpResult};
