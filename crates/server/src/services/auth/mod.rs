//! Authentication service.
//!
//! Email/password sign-up and sign-in, plus password reset with a 6-digit
//! code delivered by email.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use sqlx::PgPool;

use food_order_core::Email;

use crate::db::{ProfileRepository, RepositoryError, ResetCodeRepository, UserRepository};
use crate::models::CurrentUser;
use crate::services::email::{EmailService, generate_verification_code};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 6;

/// How long a reset code stays valid.
const RESET_CODE_TTL_MINUTES: i64 = 30;

/// Sign-up form.
#[derive(Debug, Clone, Default)]
pub struct SignUp<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
    pub full_name: Option<&'a str>,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    profiles: ProfileRepository<'a>,
    reset_codes: ResetCodeRepository<'a>,
    email: Option<&'a EmailService>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    ///
    /// Without an `email` service, reset codes are stored but not delivered.
    #[must_use]
    pub const fn new(pool: &'a PgPool, email: Option<&'a EmailService>) -> Self {
        Self {
            users: UserRepository::new(pool),
            profiles: ProfileRepository::new(pool),
            reset_codes: ResetCodeRepository::new(pool),
            email,
        }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register a new customer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` if a field is blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::PasswordMismatch` if the confirmation differs.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn sign_up(&self, form: SignUp<'_>) -> Result<CurrentUser, AuthError> {
        let email = validate_sign_up(&form)?;
        let password_hash = hash_password(form.password)?;
        let full_name = form.full_name.map(str::trim).filter(|n| !n.is_empty());

        let user = self
            .users
            .create_with_password(&email, &password_hash, full_name)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User signed up");

        Ok(CurrentUser {
            id: user.id,
            email: user.email,
            group: food_order_core::ProfileGroup::User,
        })
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<CurrentUser, AuthError> {
        require("Email", email)?;
        require("Password", password)?;
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        let profile = self
            .profiles
            .get(user.id)
            .await?
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!("user {} has no profile", user.id))
            })?;

        Ok(CurrentUser {
            id: user.id,
            email: user.email,
            group: profile.group,
        })
    }

    // =========================================================================
    // Password Reset
    // =========================================================================

    /// Issue a reset code for `email` and send it.
    ///
    /// Succeeds whether or not an account exists, so the response does not
    /// reveal which emails are registered.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed address and
    /// `AuthError::Repository` if the code cannot be stored.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        require("Email", email)?;
        let email = Email::parse(email)?;

        if self.users.get_by_email(&email).await?.is_none() {
            tracing::info!("Password reset requested for unknown email");
            return Ok(());
        }

        let code = generate_verification_code();
        let expires_at = Utc::now() + Duration::minutes(RESET_CODE_TTL_MINUTES);
        self.reset_codes.replace(&email, &code, expires_at).await?;

        match self.email {
            Some(mailer) => {
                if let Err(e) = mailer.send_reset_code(email.as_str(), &code).await {
                    tracing::error!(error = %e, "Failed to send password reset email");
                }
            }
            None => tracing::warn!("SMTP not configured, password reset email not sent"),
        }

        Ok(())
    }

    /// Check a reset code without consuming it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResetCode` if no code matches and
    /// `AuthError::ExpiredResetCode` if it matched but expired.
    pub async fn verify_reset_code(&self, email: &str, code: &str) -> Result<Email, AuthError> {
        require("Email", email)?;
        require("Verification code", code)?;
        if !is_reset_code_format(code) {
            return Err(AuthError::InvalidResetCode);
        }
        let email = Email::parse(email)?;

        let expires_at = self
            .reset_codes
            .find_expiry(&email, code)
            .await?
            .ok_or(AuthError::InvalidResetCode)?;

        if expires_at < Utc::now() {
            return Err(AuthError::ExpiredResetCode);
        }

        Ok(email)
    }

    /// Set a new password using a valid reset code, then discard the codes.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::verify_reset_code`], plus
    /// `AuthError::WeakPassword` for a short password.
    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        require("New password", new_password)?;
        let email = self.verify_reset_code(email, code).await?;
        validate_password(new_password)?;

        let password_hash = hash_password(new_password)?;
        self.users
            .update_password(&email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::InvalidResetCode,
                other => AuthError::Repository(other),
            })?;
        self.reset_codes.delete_for(&email).await?;

        tracing::info!("Password reset completed");
        Ok(())
    }
}

/// Reject blank required fields.
fn require(field: &'static str, value: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        return Err(AuthError::MissingField(field));
    }
    Ok(())
}

/// Validate the sign-up form in the order the form shows its fields.
fn validate_sign_up(form: &SignUp<'_>) -> Result<Email, AuthError> {
    require("Email", form.email)?;
    require("Password", form.password)?;
    require("Password confirmation", form.confirm_password)?;

    let email = Email::parse(form.email)?;
    validate_password(form.password)?;

    if form.password != form.confirm_password {
        return Err(AuthError::PasswordMismatch);
    }

    Ok(email)
}

fn is_reset_code_format(code: &str) -> bool {
    code.len() == 6 && code.chars().all(|c| c.is_ascii_digit())
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form<'a>(email: &'a str, password: &'a str, confirm: &'a str) -> SignUp<'a> {
        SignUp {
            email,
            password,
            confirm_password: confirm,
            full_name: None,
        }
    }

    #[test]
    fn test_sign_up_requires_fields() {
        assert!(matches!(
            validate_sign_up(&form("", "secret1", "secret1")),
            Err(AuthError::MissingField("Email"))
        ));
        assert!(matches!(
            validate_sign_up(&form("a@b.co", "secret1", " ")),
            Err(AuthError::MissingField("Password confirmation"))
        ));
    }

    #[test]
    fn test_sign_up_validates_email_then_password() {
        assert!(matches!(
            validate_sign_up(&form("not-an-email", "abc", "xyz")),
            Err(AuthError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_sign_up(&form("a@b.co", "abc", "abc")),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(matches!(
            validate_sign_up(&form("a@b.co", "secret1", "secret2")),
            Err(AuthError::PasswordMismatch)
        ));
    }

    #[test]
    fn test_sign_up_normalizes_email() {
        let email = validate_sign_up(&form(" Pat@Example.COM ", "secret1", "secret1")).unwrap();
        assert_eq!(email.as_str(), "pat@example.com");
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("hunter22").unwrap();
        assert!(verify_password("hunter22", &hash).is_ok());
        assert!(matches!(
            verify_password("hunter23", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_reset_code_format() {
        assert!(is_reset_code_format("012345"));
        assert!(!is_reset_code_format("12345"));
        assert!(!is_reset_code_format("12a456"));
    }
}
