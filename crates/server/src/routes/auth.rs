//! Authentication route handlers.
//!
//! Sign-up, sign-in and sign-out against the session, plus the three-step
//! password reset flow (request code, verify code, set new password).

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use food_order_core::{Email, ProfileGroup, UserId};

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::AuthService;
use crate::services::auth::SignUp;
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Sign-up request.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    pub full_name: Option<String>,
}

/// Sign-in request.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Forgot password request.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

/// Verify reset code request.
#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub code: String,
}

/// Reset password request.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub new_password: String,
}

/// The signed-in user, as returned to the app.
#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: UserId,
    pub email: Email,
    pub group: ProfileGroup,
}

impl From<CurrentUser> for SessionUser {
    fn from(user: CurrentUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            group: user.group,
        }
    }
}

/// Generic success message.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

const fn message(message: &'static str) -> Json<MessageResponse> {
    Json(MessageResponse {
        success: true,
        message,
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// Create an account and sign it in.
#[instrument(skip(state, session, request))]
pub async fn sign_up(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<SessionUser>)> {
    let auth = AuthService::new(state.pool(), state.email());
    let user = auth
        .sign_up(SignUp {
            email: &request.email,
            password: &request.password,
            confirm_password: &request.confirm_password,
            full_name: request.full_name.as_deref(),
        })
        .await?;

    set_current_user(&session, &user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Sign in with email and password.
#[instrument(skip(state, session, request))]
pub async fn sign_in(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<SignInRequest>,
) -> Result<Json<SessionUser>> {
    let auth = AuthService::new(state.pool(), state.email());
    let user = auth.sign_in(&request.email, &request.password).await?;

    set_current_user(&session, &user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, group = %user.group, "User signed in");

    Ok(Json(user.into()))
}

/// End the session.
#[instrument(skip(session))]
pub async fn sign_out(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// Email a reset code.
#[instrument(skip(state, request))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let auth = AuthService::new(state.pool(), state.email());
    auth.request_password_reset(&request.email).await?;

    Ok(message(
        "If an account exists for this email, a verification code has been sent",
    ))
}

/// Check a reset code before asking for the new password.
#[instrument(skip(state, request))]
pub async fn verify_reset_code(
    State(state): State<AppState>,
    Json(request): Json<VerifyCodeRequest>,
) -> Result<Json<MessageResponse>> {
    let auth = AuthService::new(state.pool(), state.email());
    auth.verify_reset_code(&request.email, &request.code).await?;

    Ok(message("Verification code is valid"))
}

/// Set a new password with a reset code.
#[instrument(skip(state, request))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let auth = AuthService::new(state.pool(), state.email());
    auth.reset_password(&request.email, &request.code, &request.new_password)
        .await?;

    Ok(message("Password updated successfully"))
}
