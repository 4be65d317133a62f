//! Customer order handlers and order event streams.

use std::convert::Infallible;

use axum::{
    Json,
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use tracing::instrument;

use food_order_core::OrderId;

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, Order, OrderDetail};
use crate::routes::events::order_event_stream;
use crate::services::EventFilter;
use crate::state::AppState;

/// The signed-in user's orders, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders))
}

/// One order with its items. Customers only see their own orders.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Json<OrderDetail>> {
    let id = OrderId::new(id);
    let detail = OrderRepository::new(state.pool())
        .get_detail(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    ensure_visible(&user, &detail.order)?;
    Ok(Json(detail))
}

/// Live feed of order changes: every order for admins, own orders otherwise.
pub async fn events(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let filter = if user.is_admin() {
        EventFilter::All
    } else {
        EventFilter::User(user.id)
    };

    tracing::debug!(user_id = %user.id, ?filter, "Order event subscriber connected");
    Sse::new(order_event_stream(state.order_events().subscribe(), filter))
        .keep_alive(KeepAlive::default())
}

/// Live status updates for one order.
pub async fn order_events(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let id = OrderId::new(id);
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;
    ensure_visible(&user, &order)?;

    // Subscribe after the lookup; the client refetches on connect anyway.
    let stream = order_event_stream(state.order_events().subscribe(), EventFilter::Order(id));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn ensure_visible(user: &CurrentUser, order: &Order) -> Result<()> {
    if order.user_id == user.id || user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You can only view your own orders".to_string(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use food_order_core::{Email, OrderStatus, ProfileGroup, UserId};

    use super::*;

    fn user(group: ProfileGroup) -> CurrentUser {
        CurrentUser {
            id: UserId::generate(),
            email: Email::parse("pat@example.com").unwrap(),
            group,
        }
    }

    fn order_for(user_id: UserId) -> Order {
        Order {
            id: OrderId::new(1),
            user_id,
            total: Decimal::new(1299, 2),
            status: OrderStatus::New,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_owner_can_view_order() {
        let me = user(ProfileGroup::User);
        assert!(ensure_visible(&me, &order_for(me.id)).is_ok());
    }

    #[test]
    fn test_other_customer_is_forbidden() {
        let me = user(ProfileGroup::User);
        assert!(matches!(
            ensure_visible(&me, &order_for(UserId::generate())),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_admin_can_view_any_order() {
        let admin = user(ProfileGroup::Admin);
        assert!(ensure_visible(&admin, &order_for(UserId::generate())).is_ok());
    }
}
