//! Cart route handlers.
//!
//! The cart lives in the session under [`keys::CART`]. Every handler loads
//! it, applies one [`Cart`] operation and writes it back.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use food_order_core::{Cart, CartItem, CartItemId, PizzaSize, ProductId, QuantityChange};

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::session::keys;
use crate::services::MenuService;
use crate::state::AppState;

/// Cart as returned to the app.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub total: Decimal,
    pub item_count: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.items().to_vec(),
            total: cart.total(),
            item_count: cart.item_count(),
        }
    }
}

/// Add-to-cart request.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: i32,
    #[serde(default)]
    pub size: PizzaSize,
}

/// Quantity change request: `1` or `-1`.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub amount: i8,
}

/// Load the session cart (empty if none yet).
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn load_cart(session: &Session) -> Result<Cart> {
    Ok(session.get::<Cart>(keys::CART).await?.unwrap_or_default())
}

/// Write the cart back to the session.
///
/// # Errors
///
/// Returns an error if the session store cannot be written.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(keys::CART, cart).await?;
    Ok(())
}

/// Show the cart.
#[instrument(skip(session, _user))]
pub async fn show(session: Session, RequireAuth(_user): RequireAuth) -> Result<Json<CartView>> {
    let cart = load_cart(&session).await?;
    Ok(Json(CartView::from(&cart)))
}

/// Add one unit of a product in a size.
#[instrument(skip(state, session, _user))]
pub async fn add_item(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(_user): RequireAuth,
    Json(request): Json<AddItemRequest>,
) -> Result<Json<CartView>> {
    let product = MenuService::new(state.pool(), state.menu_cache())
        .get(ProductId::new(request.product_id))
        .await?;

    let mut cart = load_cart(&session).await?;
    cart.add_item(product.to_cart_product(), request.size);
    save_cart(&session, &cart).await?;

    Ok(Json(CartView::from(&cart)))
}

/// Increment or decrement one line; a line that reaches zero is removed.
#[instrument(skip(session, _user))]
pub async fn update_quantity(
    session: Session,
    RequireAuth(_user): RequireAuth,
    Path(item_id): Path<Uuid>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Json<CartView>> {
    let change = QuantityChange::from_amount(request.amount)
        .ok_or_else(|| AppError::BadRequest("amount must be 1 or -1".to_string()))?;

    let mut cart = load_cart(&session).await?;
    cart.update_quantity(CartItemId::new(item_id), change)?;
    save_cart(&session, &cart).await?;

    Ok(Json(CartView::from(&cart)))
}

/// Empty the cart.
#[instrument(skip(session, _user))]
pub async fn clear(session: Session, RequireAuth(_user): RequireAuth) -> Result<StatusCode> {
    session.remove::<Cart>(keys::CART).await?;
    Ok(StatusCode::NO_CONTENT)
}
