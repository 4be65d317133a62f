//! Profile route handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use crate::db::ProfileRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::Profile;
use crate::services::notifications::is_expo_token;
use crate::state::AppState;

/// Push token registration.
#[derive(Debug, Deserialize)]
pub struct PushTokenRequest {
    /// `None` unregisters the device.
    pub token: Option<String>,
}

/// Editable profile fields.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// The signed-in user's profile.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Profile>> {
    ProfileRepository::new(state.pool())
        .get(user.id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("profile".to_string()))
}

/// Update name and avatar.
#[instrument(skip(state, user, request), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Profile>> {
    let full_name = request.full_name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let avatar_url = request.avatar_url.as_deref().map(str::trim).filter(|u| !u.is_empty());

    let profile = ProfileRepository::new(state.pool())
        .update_details(user.id, full_name, avatar_url)
        .await?;
    Ok(Json(profile))
}

/// Store the device's push token so status changes reach the customer.
#[instrument(skip(state, user, request), fields(user_id = %user.id))]
pub async fn set_push_token(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<PushTokenRequest>,
) -> Result<StatusCode> {
    let token = request.token.as_deref().map(str::trim).filter(|t| !t.is_empty());
    if let Some(token) = token
        && !is_expo_token(token)
    {
        return Err(AppError::BadRequest("invalid push token".to_string()));
    }

    ProfileRepository::new(state.pool())
        .set_push_token(user.id, token)
        .await?;

    tracing::info!(registered = token.is_some(), "Push token updated");
    Ok(StatusCode::NO_CONTENT)
}
