//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Error bodies are JSON: `{"error": "<message>"}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use food_order_core::CartError;

use crate::db::RepositoryError;
use crate::services::{AuthError, CheckoutError, MenuError, PaymentError, StorageError};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Payment provider call failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Menu operation failed.
    #[error("Menu error: {0}")]
    Menu(#[from] MenuError),

    /// Session store operation failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Image upload failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl AppError {
    /// Whether this error is our fault and should be reported.
    const fn is_server_error(&self) -> bool {
        match self {
            Self::Database(_) | Self::Session(_) => true,
            Self::Storage(err) => matches!(err, StorageError::Io(_)),
            Self::Menu(err) => matches!(err, MenuError::Repository(_)),
            Self::Auth(err) => matches!(err, AuthError::Repository(_) | AuthError::PasswordHash),
            Self::Payment(err) => matches!(
                err,
                PaymentError::Http(_) | PaymentError::Api { .. } | PaymentError::Parse(_)
            ),
            Self::Checkout(err) => matches!(
                err,
                CheckoutError::CreateOrder(_) | CheckoutError::CreateOrderItems { .. }
            ),
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::MissingField(_)
                | AuthError::WeakPassword(_)
                | AuthError::InvalidEmail(_)
                | AuthError::PasswordMismatch
                | AuthError::InvalidResetCode
                | AuthError::ExpiredResetCode => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Cart(CartError::ItemNotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart | CheckoutError::Total(_) => StatusCode::BAD_REQUEST,
                CheckoutError::Payment(payment) => payment_status(payment),
                CheckoutError::PaymentAlreadyUsed(_) => StatusCode::CONFLICT,
                CheckoutError::CreateOrder(_) | CheckoutError::CreateOrderItems { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Payment(err) => payment_status(err),
            Self::Menu(err) => match err {
                MenuError::Validation(_) => StatusCode::BAD_REQUEST,
                MenuError::NotFound => StatusCode::NOT_FOUND,
                MenuError::InUse => StatusCode::CONFLICT,
                MenuError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Storage(err) => match err {
                StorageError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                StorageError::Empty | StorageError::UnsupportedType => StatusCode::BAD_REQUEST,
                StorageError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message safe to show to the client.
    fn public_message(&self) -> String {
        match self {
            Self::Database(RepositoryError::NotFound) => "Not found".to_string(),
            Self::Database(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Database(_) | Self::Session(_) => "Internal server error".to_string(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    "Authentication error".to_string()
                }
                other => capitalize(&other.to_string()),
            },
            Self::Cart(_) => "Cart item not found".to_string(),
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart => "Your cart is empty".to_string(),
                CheckoutError::Total(_) => "Invalid cart total".to_string(),
                CheckoutError::Payment(payment) => payment_message(payment),
                CheckoutError::PaymentAlreadyUsed(_) => {
                    "This payment has already been used for an order".to_string()
                }
                CheckoutError::CreateOrder(_) => "Failed to create order".to_string(),
                CheckoutError::CreateOrderItems { .. } => {
                    "Failed to save order items".to_string()
                }
            },
            Self::Payment(err) => payment_message(err),
            Self::Menu(MenuError::Repository(_)) => "Internal server error".to_string(),
            Self::Menu(err) => capitalize(&err.to_string()),
            Self::Storage(StorageError::Io(_)) => "Failed to store image".to_string(),
            Self::Storage(err) => capitalize(&err.to_string()),
            Self::NotFound(_) | Self::Forbidden(_) | Self::BadRequest(_) => self.to_string(),
        }
    }
}

const fn payment_status(err: &PaymentError) -> StatusCode {
    match err {
        PaymentError::InvalidIntentId(_) => StatusCode::BAD_REQUEST,
        PaymentError::NotAuthorized(_)
        | PaymentError::AmountMismatch { .. }
        | PaymentError::CustomerMismatch => StatusCode::PAYMENT_REQUIRED,
        PaymentError::Http(_) | PaymentError::Api { .. } | PaymentError::Parse(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

fn payment_message(err: &PaymentError) -> String {
    match err {
        PaymentError::InvalidIntentId(_) => "Invalid payment intent ID".to_string(),
        PaymentError::NotAuthorized(_) => "Payment was not completed".to_string(),
        PaymentError::AmountMismatch { .. } => {
            "Payment amount does not match the cart total".to_string()
        }
        PaymentError::CustomerMismatch => "Payment does not belong to this account".to_string(),
        _ => "Payment service error".to_string(),
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();
        // Don't expose internal error details to clients
        let body = ErrorBody {
            error: self.public_message(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order 12".to_string());
        assert_eq!(err.to_string(), "Not found: order 12");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(RepositoryError::DataCorruption("test".to_string()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_checkout_error_status_codes() {
        assert_eq!(
            get_status(CheckoutError::EmptyCart.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(CheckoutError::Payment(PaymentError::CustomerMismatch).into()),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            get_status(CheckoutError::CreateOrder(RepositoryError::NotFound).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(CheckoutError::PaymentAlreadyUsed("pi_1".to_string()).into()),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_malformed_intent_id_is_a_client_error() {
        let err = AppError::from(CheckoutError::Payment(PaymentError::InvalidIntentId(
            "pi_1/../refunds".to_string(),
        )));
        assert!(!err.is_server_error());
        assert_eq!(get_status(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_menu_and_storage_status_codes() {
        assert_eq!(get_status(MenuError::InUse.into()), StatusCode::CONFLICT);
        assert_eq!(get_status(MenuError::NotFound.into()), StatusCode::NOT_FOUND);
        assert_eq!(
            get_status(StorageError::TooLarge { size: 10, max: 5 }.into()),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[tokio::test]
    async fn test_error_body_is_json_and_hides_internals() {
        let response = AppError::from(RepositoryError::DataCorruption(
            "db password leaked".to_string(),
        ))
        .into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "Internal server error");
    }

    #[test]
    fn test_auth_messages() {
        assert_eq!(
            AppError::from(AuthError::PasswordMismatch).public_message(),
            "Passwords do not match"
        );
        assert_eq!(
            AppError::from(AuthError::MissingField("Email")).public_message(),
            "Email is required"
        );
    }
}
