//! Payment sheet and checkout handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use food_order_core::{Cart, to_minor_units};

use crate::db::{OrderRepository, ProfileRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, Order, session::keys};
use crate::routes::cart::load_cart;
use crate::services::payments::{PaymentError, PaymentSheet, is_intent_id};
use crate::services::{CheckoutService, OrderEvent, checkout::CheckoutRequest};
use crate::state::AppState;

/// Checkout request.
#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    /// ID of the payment intent the payment sheet completed.
    #[serde(default)]
    pub payment_intent_id: String,
}

/// Provider customer for `user`, created and remembered on first use.
async fn ensure_customer(state: &AppState, user: &CurrentUser) -> Result<String> {
    let profiles = ProfileRepository::new(state.pool());
    let profile = profiles
        .get(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("profile".to_string()))?;

    if let Some(customer_id) = profile.stripe_customer_id {
        return Ok(customer_id);
    }

    let customer_id = state
        .stripe()
        .create_customer(user.email.as_str(), profile.full_name.as_deref())
        .await?;
    profiles.set_stripe_customer_id(user.id, &customer_id).await?;

    tracing::info!(user_id = %user.id, "Payment customer created");
    Ok(customer_id)
}

/// Prepare the payment sheet for the current cart total.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn payment_sheet(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Json<PaymentSheet>> {
    let cart = load_cart(&session).await?;
    let amount = to_minor_units(cart.total())
        .map_err(|e| AppError::BadRequest(format!("invalid cart total: {e}")))?;
    if amount <= 0 {
        return Err(AppError::BadRequest(
            "Amount must be greater than zero".to_string(),
        ));
    }

    let customer_id = ensure_customer(&state, &user).await?;
    let sheet = state.stripe().prepare_sheet(&customer_id, amount).await?;

    tracing::info!(amount, "Payment sheet prepared");
    Ok(Json(sheet))
}

/// Place the order for the current cart.
///
/// The cart is cleared only after the order and all its items are written.
#[instrument(skip(state, session, user, body), fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Json(body): Json<CheckoutBody>,
) -> Result<(StatusCode, Json<Order>)> {
    let payment_intent_id = body.payment_intent_id.trim();
    if payment_intent_id.is_empty() {
        return Err(AppError::BadRequest(
            "payment_intent_id is required".to_string(),
        ));
    }
    if !is_intent_id(payment_intent_id) {
        return Err(PaymentError::InvalidIntentId(payment_intent_id.to_owned()).into());
    }

    let cart = load_cart(&session).await?;
    let customer_id = ProfileRepository::new(state.pool())
        .get(user.id)
        .await?
        .and_then(|p| p.stripe_customer_id);

    let orders = OrderRepository::new(state.pool());
    let order = CheckoutService::new(state.stripe(), &orders)
        .place_order(
            &cart,
            CheckoutRequest {
                user_id: user.id,
                payment_intent_id,
                customer_id: customer_id.as_deref(),
            },
        )
        .await?;

    // The order is placed; a failed clear must not make the client retry.
    if let Err(e) = session.remove::<Cart>(keys::CART).await {
        tracing::error!(order_id = %order.id, error = %e, "Failed to clear cart after checkout");
    }
    state.order_events().publish(OrderEvent::created(&order));

    Ok((StatusCode::CREATED, Json(order)))
}
