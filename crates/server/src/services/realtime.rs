//! In-process order change feed.
//!
//! Every write to an order publishes an [`OrderEvent`]. Clients subscribe
//! over server-sent events and refetch whatever the event invalidates: the
//! order lists on any event, a single order's detail on its own updates.

use serde::Serialize;
use tokio::sync::broadcast;

use food_order_core::{OrderId, OrderStatus, UserId};

use crate::models::Order;

/// Buffered events per subscriber before it starts lagging.
const CHANNEL_CAPACITY: usize = 256;

/// A change to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    /// A checkout wrote a new order.
    Created { order_id: OrderId, user_id: UserId },
    /// An admin moved an order to a new status.
    StatusChanged {
        order_id: OrderId,
        user_id: UserId,
        status: OrderStatus,
    },
}

impl OrderEvent {
    #[must_use]
    pub const fn created(order: &Order) -> Self {
        Self::Created {
            order_id: order.id,
            user_id: order.user_id,
        }
    }

    #[must_use]
    pub const fn status_changed(order: &Order) -> Self {
        Self::StatusChanged {
            order_id: order.id,
            user_id: order.user_id,
            status: order.status,
        }
    }

    #[must_use]
    pub const fn order_id(&self) -> OrderId {
        match self {
            Self::Created { order_id, .. } | Self::StatusChanged { order_id, .. } => *order_id,
        }
    }

    #[must_use]
    pub const fn user_id(&self) -> UserId {
        match self {
            Self::Created { user_id, .. } | Self::StatusChanged { user_id, .. } => *user_id,
        }
    }

    /// SSE event name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Created { .. } => "order_created",
            Self::StatusChanged { .. } => "order_updated",
        }
    }
}

/// Which events a subscriber wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFilter {
    /// Every order (admin queue).
    All,
    /// Orders placed by one customer.
    User(UserId),
    /// Updates to one order.
    Order(OrderId),
}

impl EventFilter {
    #[must_use]
    pub fn matches(self, event: &OrderEvent) -> bool {
        match self {
            Self::All => true,
            Self::User(user_id) => event.user_id() == user_id,
            Self::Order(order_id) => {
                matches!(event, OrderEvent::StatusChanged { .. }) && event.order_id() == order_id
            }
        }
    }
}

/// Broadcast hub for order events.
#[derive(Clone)]
pub struct OrderEvents {
    sender: broadcast::Sender<OrderEvent>,
}

impl Default for OrderEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderEvents {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: OrderEvent) {
        let receivers = self.sender.send(event).unwrap_or(0);
        tracing::debug!(receivers, "Order event published");
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<OrderEvent> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn status_event(order: i32, user: UserId) -> OrderEvent {
        OrderEvent::StatusChanged {
            order_id: OrderId::new(order),
            user_id: user,
            status: OrderStatus::Cooking,
        }
    }

    #[test]
    fn test_filter_all() {
        let event = status_event(1, UserId::generate());
        assert!(EventFilter::All.matches(&event));
    }

    #[test]
    fn test_filter_user_only_sees_own_orders() {
        let me = UserId::generate();
        let other = UserId::generate();

        assert!(EventFilter::User(me).matches(&status_event(1, me)));
        assert!(!EventFilter::User(me).matches(&status_event(2, other)));
    }

    #[test]
    fn test_filter_order_only_sees_its_updates() {
        let user = UserId::generate();
        let filter = EventFilter::Order(OrderId::new(5));

        assert!(filter.matches(&status_event(5, user)));
        assert!(!filter.matches(&status_event(6, user)));
        assert!(!filter.matches(&OrderEvent::Created {
            order_id: OrderId::new(5),
            user_id: user,
        }));
    }

    #[test]
    fn test_event_json_shape() {
        let user = UserId::generate();
        let json = serde_json::to_value(status_event(3, user)).unwrap();
        assert_eq!(json["type"], "status_changed");
        assert_eq!(json["order_id"], 3);
        assert_eq!(json["status"], "Cooking");
    }

    #[tokio::test]
    async fn test_publish_reaches_subscribers() {
        let events = OrderEvents::new();
        let mut rx = events.subscribe();
        let event = status_event(9, UserId::generate());

        events.publish(event.clone());

        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[test]
    fn test_publish_without_subscribers() {
        OrderEvents::new().publish(status_event(1, UserId::generate()));
    }
}
