//! Database module - MySQL connection handling and repositories.

use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

use crate::InfrastructureError;

pub mod repositories;

pub use repositories::{MySqlChallengeRepository, MySqlProviderConfigRepository};

/// Database connection configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// MySQL connection URL
    pub url: String,
    /// Maximum number of pooled connections
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads `DATABASE_URL` (required) and `DATABASE_MAX_CONNECTIONS`
    /// (default 10); a `.env` file is honored when present.
    pub fn from_env() -> Result<Self, InfrastructureError> {
        dotenvy::dotenv().ok();

        let url = std::env::var("DATABASE_URL")
            .map_err(|_| InfrastructureError::Config("DATABASE_URL not set".to_string()))?;

        Ok(Self {
            url,
            max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        })
    }
}

/// Create a MySQL connection pool from configuration
pub async fn create_pool(config: &DatabaseConfig) -> Result<MySqlPool, InfrastructureError> {
    let pool = MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        "Database connection pool initialized"
    );

    Ok(pool)
}
