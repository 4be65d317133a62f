//! Admin order queue handlers.
//!
//! Every handler requires the admin group. Status changes are broadcast to
//! the order event feed and pushed to the customer's device.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use food_order_core::{OrderId, OrderStatus};

use crate::db::{OrderRepository, ProfileRepository};
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::Order;
use crate::services::OrderEvent;
use crate::state::AppState;

/// Query for the admin order lists.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    /// `true` for delivered orders, otherwise the active queue.
    #[serde(default)]
    pub archived: bool,
}

/// Status change request.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Active or archived orders of every customer, newest first.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn list_orders(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_by_archived(query.archived)
        .await?;
    Ok(Json(orders))
}

/// Move an order to a new status and tell its owner.
#[instrument(skip(state, admin, body), fields(admin_id = %admin.id, status = %body.status))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<i32>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<Order>> {
    let id = OrderId::new(id);
    let order = OrderRepository::new(state.pool())
        .update_status(id, body.status)
        .await?;

    tracing::info!(
        order_id = %order.id,
        status = %order.status,
        archived = order.status.is_archived(),
        "Order status updated"
    );
    state.order_events().publish(OrderEvent::status_changed(&order));

    let token = match ProfileRepository::new(state.pool())
        .push_token_for_order(order.id)
        .await
    {
        Ok(token) => token,
        Err(e) => {
            tracing::warn!(order_id = %order.id, error = %e, "Failed to look up push token");
            None
        }
    };

    // Delivery can be slow; the admin should not wait on it.
    let push = state.push().clone();
    let (order_id, status) = (order.id, order.status);
    tokio::spawn(async move {
        push.notify_order_status(token.as_deref(), order_id, status)
            .await;
    });

    Ok(Json(order))
}
