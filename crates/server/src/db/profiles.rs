//! Profile repository.

use sqlx::PgPool;

use food_order_core::{Email, ProfileGroup, UserId};

use super::RepositoryError;
use crate::models::Profile;

const PROFILE_COLUMNS: &str = r#"id, "group", full_name, avatar_url, expo_push_token, stripe_customer_id, updated_at"#;

/// Repository for profile database operations.
pub struct ProfileRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProfileRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a profile by user ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: UserId) -> Result<Option<Profile>, RepositoryError> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(profile)
    }

    /// Update the editable profile fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile doesn't exist.
    pub async fn update_details(
        &self,
        id: UserId,
        full_name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<Profile, RepositoryError> {
        sqlx::query_as::<_, Profile>(&format!(
            r"
            UPDATE profiles
            SET full_name = $2, avatar_url = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {PROFILE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(full_name)
        .bind(avatar_url)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Store (or clear) the device push token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile doesn't exist.
    pub async fn set_push_token(
        &self,
        id: UserId,
        token: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE profiles SET expo_push_token = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(token)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remember the payment provider's customer ID for this user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_stripe_customer_id(
        &self,
        id: UserId,
        customer_id: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE profiles SET stripe_customer_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(customer_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Push token of the user who placed `order_id`, if they registered one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn push_token_for_order(
        &self,
        order_id: food_order_core::OrderId,
    ) -> Result<Option<String>, RepositoryError> {
        let token: Option<Option<String>> = sqlx::query_scalar(
            r"
            SELECT p.expo_push_token
            FROM orders o
            JOIN profiles p ON p.id = o.user_id
            WHERE o.id = $1
            ",
        )
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(token.flatten())
    }

    /// Change the role group of the user with `email`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this email.
    pub async fn set_group_by_email(
        &self,
        email: &Email,
        group: ProfileGroup,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE profiles p
            SET "group" = $2, updated_at = NOW()
            FROM users u
            WHERE u.id = p.id AND u.email = $1
            "#,
        )
        .bind(email.as_str())
        .bind(group)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
