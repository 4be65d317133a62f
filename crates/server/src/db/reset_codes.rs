//! Password reset code storage.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use food_order_core::Email;

use super::RepositoryError;

/// Repository for password reset codes.
pub struct ResetCodeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ResetCodeRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a new code, replacing any earlier codes for the same email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn replace(
        &self,
        email: &Email,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM password_reset_codes WHERE email = $1")
            .bind(email.as_str())
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO password_reset_codes (email, code, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(email.as_str())
        .bind(code)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Expiry of the matching code, if one was issued.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_expiry(
        &self,
        email: &Email,
        code: &str,
    ) -> Result<Option<DateTime<Utc>>, RepositoryError> {
        let expires_at = sqlx::query_scalar(
            r"
            SELECT expires_at
            FROM password_reset_codes
            WHERE email = $1 AND code = $2
            ORDER BY expires_at DESC
            LIMIT 1
            ",
        )
        .bind(email.as_str())
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        Ok(expires_at)
    }

    /// Remove every code for `email`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_for(&self, email: &Email) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM password_reset_codes WHERE email = $1")
            .bind(email.as_str())
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
