//! Configuration for the dispatch service

use crate::domain::entities::challenge::{DEFAULT_EXPIRATION_MINUTES, MAX_ATTEMPTS};

/// Configuration for challenge issuance
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Number of minutes before an issued challenge expires
    pub code_expiration_minutes: i64,
    /// Maximum number of verification attempts per challenge
    pub max_attempts: i32,
    /// SMS body template; `{code}` is replaced with the generated code
    pub message_template: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            code_expiration_minutes: DEFAULT_EXPIRATION_MINUTES,
            max_attempts: MAX_ATTEMPTS,
            message_template: "Your verification code is: {code}. Valid for 5 minutes."
                .to_string(),
        }
    }
}
