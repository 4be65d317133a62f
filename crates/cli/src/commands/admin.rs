//! Admin group management.
//!
//! Accounts are created through the app's sign-up screen and always start in
//! the customer group. These commands move an existing account between
//! groups; the change applies to live sessions from their next request.

use thiserror::Error;

use food_order_core::{Email, ProfileGroup};
use food_order_server::db::{ProfileRepository, RepositoryError};

use super::{CommandError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No account uses this email.
    #[error("No user with email: {0}")]
    UserNotFound(String),

    #[error("Database error: {0}")]
    Repository(RepositoryError),
}

/// Give `email` access to admin mode.
///
/// # Errors
///
/// Returns an error if the email is malformed or has no account.
pub async fn promote(email: &str) -> Result<(), AdminError> {
    set_group(email, ProfileGroup::Admin).await
}

/// Return `email` to the customer group.
///
/// # Errors
///
/// Returns an error if the email is malformed or has no account.
pub async fn demote(email: &str) -> Result<(), AdminError> {
    set_group(email, ProfileGroup::User).await
}

async fn set_group(email: &str, group: ProfileGroup) -> Result<(), AdminError> {
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    let pool = connect().await?;

    ProfileRepository::new(&pool)
        .set_group_by_email(&email, group)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AdminError::UserNotFound(email.to_string()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!("Moved {} to group {}", email, group);
    Ok(())
}
