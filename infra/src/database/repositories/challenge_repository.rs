//! MySQL implementation of the ChallengeRepository trait.
//!
//! Challenge rows live in the `otp_challenges` table. Expiry is evaluated
//! in the queries (`expires_at > NOW()`), never by a sweep job, and the
//! verified flip is a conditional UPDATE so concurrent verifications
//! serialize at the database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use otp_core::domain::entities::challenge::Challenge;
use otp_core::errors::{OtpError, OtpResult};
use otp_core::phone::mask_phone;
use otp_core::repositories::ChallengeRepository;

/// MySQL implementation of ChallengeRepository
pub struct MySqlChallengeRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlChallengeRepository {
    /// Create a new MySQL challenge repository
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn storage_error(context: &str, e: impl std::fmt::Display) -> OtpError {
        OtpError::Storage {
            message: format!("{context}: {e}"),
        }
    }

    /// Convert a database row to a Challenge entity
    fn row_to_challenge(row: &sqlx::mysql::MySqlRow) -> OtpResult<Challenge> {
        let id: String = row
            .try_get("id")
            .map_err(|e| Self::storage_error("Failed to get id", e))?;

        Ok(Challenge {
            id: Uuid::parse_str(&id)
                .map_err(|e| Self::storage_error("Invalid challenge UUID", e))?,
            phone: row
                .try_get("phone")
                .map_err(|e| Self::storage_error("Failed to get phone", e))?,
            code: row
                .try_get("code")
                .map_err(|e| Self::storage_error("Failed to get code", e))?,
            country_code: row
                .try_get("country_code")
                .map_err(|e| Self::storage_error("Failed to get country_code", e))?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(|e| Self::storage_error("Failed to get created_at", e))?,
            expires_at: row
                .try_get::<DateTime<Utc>, _>("expires_at")
                .map_err(|e| Self::storage_error("Failed to get expires_at", e))?,
            attempts: row
                .try_get("attempts")
                .map_err(|e| Self::storage_error("Failed to get attempts", e))?,
            max_attempts: row
                .try_get("max_attempts")
                .map_err(|e| Self::storage_error("Failed to get max_attempts", e))?,
            verified: row
                .try_get("verified")
                .map_err(|e| Self::storage_error("Failed to get verified", e))?,
            verified_at: row
                .try_get::<Option<DateTime<Utc>>, _>("verified_at")
                .map_err(|e| Self::storage_error("Failed to get verified_at", e))?,
            provider_used: row
                .try_get("provider_used")
                .map_err(|e| Self::storage_error("Failed to get provider_used", e))?,
        })
    }
}

#[async_trait]
impl ChallengeRepository for MySqlChallengeRepository {
    async fn create(&self, challenge: Challenge) -> OtpResult<Challenge> {
        let query = r#"
            INSERT INTO otp_challenges (
                id, phone, code, country_code, created_at, expires_at,
                attempts, max_attempts, verified, verified_at, provider_used
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(challenge.id.to_string())
            .bind(&challenge.phone)
            .bind(&challenge.code)
            .bind(&challenge.country_code)
            .bind(challenge.created_at)
            .bind(challenge.expires_at)
            .bind(challenge.attempts)
            .bind(challenge.max_attempts)
            .bind(challenge.verified)
            .bind(challenge.verified_at)
            .bind(&challenge.provider_used)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(
                    phone = %mask_phone(&challenge.phone),
                    error = %e,
                    "Failed to store challenge"
                );
                Self::storage_error("Failed to store challenge", e)
            })?;

        tracing::debug!(
            phone = %mask_phone(&challenge.phone),
            challenge_id = %challenge.id,
            "Stored challenge"
        );

        Ok(challenge)
    }

    async fn find_active(
        &self,
        phone: &str,
        challenge_id: Option<Uuid>,
    ) -> OtpResult<Option<Challenge>> {
        let row = match challenge_id {
            Some(id) => {
                let query = r#"
                    SELECT id, phone, code, country_code, created_at, expires_at,
                           attempts, max_attempts, verified, verified_at, provider_used
                    FROM otp_challenges
                    WHERE phone = ? AND id = ? AND verified = FALSE AND expires_at > NOW()
                    ORDER BY created_at DESC
                    LIMIT 1
                "#;
                sqlx::query(query)
                    .bind(phone)
                    .bind(id.to_string())
                    .fetch_optional(&self.pool)
                    .await
            }
            None => {
                let query = r#"
                    SELECT id, phone, code, country_code, created_at, expires_at,
                           attempts, max_attempts, verified, verified_at, provider_used
                    FROM otp_challenges
                    WHERE phone = ? AND verified = FALSE AND expires_at > NOW()
                    ORDER BY created_at DESC
                    LIMIT 1
                "#;
                sqlx::query(query)
                    .bind(phone)
                    .fetch_optional(&self.pool)
                    .await
            }
        }
        .map_err(|e| {
            tracing::error!(
                phone = %mask_phone(phone),
                error = %e,
                "Failed to look up challenge"
            );
            Self::storage_error("Failed to look up challenge", e)
        })?;

        row.as_ref().map(Self::row_to_challenge).transpose()
    }

    async fn count_created_since(&self, phone: &str, since: DateTime<Utc>) -> OtpResult<u64> {
        let query = r#"
            SELECT COUNT(*) AS request_count
            FROM otp_challenges
            WHERE phone = ? AND created_at > ?
        "#;

        let row = sqlx::query(query)
            .bind(phone)
            .bind(since)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Self::storage_error("Failed to count challenges", e))?;

        let count: i64 = row
            .try_get("request_count")
            .map_err(|e| Self::storage_error("Failed to get request_count", e))?;

        Ok(count.max(0) as u64)
    }

    async fn increment_attempts(&self, id: Uuid) -> OtpResult<()> {
        let query = "UPDATE otp_challenges SET attempts = attempts + 1 WHERE id = ?";

        sqlx::query(query)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| Self::storage_error("Failed to increment attempts", e))?;

        Ok(())
    }

    async fn increment_attempts_for_phone(&self, phone: &str) -> OtpResult<u64> {
        let query = r#"
            UPDATE otp_challenges
            SET attempts = attempts + 1
            WHERE phone = ? AND verified = FALSE AND expires_at > NOW()
        "#;

        let result = sqlx::query(query)
            .bind(phone)
            .execute(&self.pool)
            .await
            .map_err(|e| Self::storage_error("Failed to increment attempts for phone", e))?;

        Ok(result.rows_affected())
    }

    async fn mark_verified(&self, id: Uuid, verified_at: DateTime<Utc>) -> OtpResult<bool> {
        // Conditional update is the engine's one transactional guarantee:
        // of any number of concurrent calls, exactly one sees a row flip.
        let query = r#"
            UPDATE otp_challenges
            SET verified = TRUE, verified_at = ?
            WHERE id = ? AND verified = FALSE
        "#;

        let result = sqlx::query(query)
            .bind(verified_at)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| Self::storage_error("Failed to mark challenge verified", e))?;

        Ok(result.rows_affected() == 1)
    }
}
