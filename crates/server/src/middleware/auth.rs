//! Authentication extractors.
//!
//! Customer routes take [`RequireAuth`]; menu and order-queue management take
//! [`RequireAdmin`]. Both start from the user stored in the session at sign-in
//! and re-read the role group from `profiles`, so a promotion or demotion
//! takes effect on the next request rather than at the next sign-in.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use food_order_core::ProfileGroup;

use crate::db::ProfileRepository;
use crate::models::CurrentUser;
use crate::models::session::keys;
use crate::state::AppState;

/// Extractor that requires a signed-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a signed-in user in the `ADMIN` group.
pub struct RequireAdmin(pub CurrentUser);

/// Error returned when the request lacks the required identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No signed-in user.
    Unauthorized,
    /// Signed in, but not an admin.
    Forbidden,
    /// The user's profile could not be read.
    Unavailable,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Sign in required"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Admin access required"),
            Self::Unavailable => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Apply the group currently on the user's profile.
///
/// A missing profile means the account is gone, so the session no longer
/// identifies anyone.
fn with_profile_group(
    mut user: CurrentUser,
    group: Option<ProfileGroup>,
) -> Result<CurrentUser, AuthRejection> {
    user.group = group.ok_or(AuthRejection::Unauthorized)?;
    Ok(user)
}

fn require_admin(user: CurrentUser) -> Result<CurrentUser, AuthRejection> {
    if user.is_admin() {
        Ok(user)
    } else {
        Err(AuthRejection::Forbidden)
    }
}

async fn current_user(parts: &Parts, state: &AppState) -> Result<CurrentUser, AuthRejection> {
    // Get the session from extensions (set by SessionManagerLayer)
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::Unauthorized)?;
    let stored = session
        .get::<CurrentUser>(keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
        .ok_or(AuthRejection::Unauthorized)?;

    let profile = ProfileRepository::new(state.pool())
        .get(stored.id)
        .await
        .map_err(|e| {
            tracing::error!(user_id = %stored.id, error = %e, "Failed to load profile for session");
            AuthRejection::Unavailable
        })?;

    let previous = stored.group;
    let user = with_profile_group(stored, profile.map(|p| p.group))?;
    if user.group != previous {
        tracing::info!(user_id = %user.id, group = ?user.group, "Session group refreshed");
        if let Err(e) = session.insert(keys::CURRENT_USER, &user).await {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to store refreshed group");
        }
    }

    Ok(user)
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        current_user(parts, state).await.map(Self)
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = current_user(parts, state).await?;

        require_admin(user).map(Self).inspect_err(|_| {
            tracing::warn!(path = %parts.uri.path(), "Non-admin denied");
        })
    }
}

/// Helper to set the current user in the session.
///
/// Cycles the session ID first so a pre-login session cannot be fixed.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_USER, user).await
}

/// Helper to end the session (sign out), dropping the cart with it.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use food_order_core::{Email, UserId};

    use super::*;

    fn session_user(group: ProfileGroup) -> CurrentUser {
        CurrentUser {
            id: UserId::generate(),
            email: Email::parse("pat@example.com").unwrap(),
            group,
        }
    }

    #[test]
    fn test_rejection_status_codes() {
        assert_eq!(
            AuthRejection::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthRejection::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthRejection::Unavailable.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_demoted_admin_loses_admin_routes() {
        let user = with_profile_group(session_user(ProfileGroup::Admin), Some(ProfileGroup::User))
            .unwrap();

        assert!(!user.is_admin());
        assert_eq!(require_admin(user).unwrap_err(), AuthRejection::Forbidden);
    }

    #[test]
    fn test_promoted_customer_gains_admin_routes() {
        let user = with_profile_group(session_user(ProfileGroup::User), Some(ProfileGroup::Admin))
            .unwrap();

        assert!(require_admin(user).is_ok());
    }

    #[test]
    fn test_missing_profile_ends_the_session_identity() {
        let result = with_profile_group(session_user(ProfileGroup::Admin), None);
        assert_eq!(result.unwrap_err(), AuthRejection::Unauthorized);
    }

    #[tokio::test]
    async fn test_no_session_is_unauthorized() {
        let state = AppState::for_tests();
        let (mut parts, ()) = axum::http::Request::builder()
            .uri("/api/orders")
            .body(())
            .unwrap()
            .into_parts();

        let result = RequireAuth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthRejection::Unauthorized)));

        let result = RequireAdmin::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthRejection::Unauthorized)));
    }
}
