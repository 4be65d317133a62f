//! Server-sent event streams of order changes.

use std::convert::Infallible;

use async_stream::stream;
use axum::response::sse::Event;
use futures::Stream;
use tokio::sync::broadcast::{Receiver, error::RecvError};

use crate::services::{EventFilter, OrderEvent};

/// Event sent when a subscriber fell behind and must refetch everything.
pub const RESYNC_EVENT: &str = "resync";

/// Turn a subscription into an SSE stream of the events `filter` accepts.
///
/// Ends when the hub is dropped.
pub fn order_event_stream(
    mut rx: Receiver<OrderEvent>,
    filter: EventFilter,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream! {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if !filter.matches(&event) {
                        continue;
                    }
                    let json = serde_json::to_string(&event).unwrap_or_else(|_| {
                        r#"{"type":"error","message":"Failed to serialize event"}"#.to_string()
                    });
                    yield Ok(Event::default().event(event.name()).data(json));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Order event subscriber lagged");
                    yield Ok(Event::default().event(RESYNC_EVENT).data("{}"));
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use futures::StreamExt;

    use food_order_core::{OrderId, OrderStatus, UserId};

    use super::*;
    use crate::services::OrderEvents;

    fn changed(order: i32, user: UserId) -> OrderEvent {
        OrderEvent::StatusChanged {
            order_id: OrderId::new(order),
            user_id: user,
            status: OrderStatus::Delivered,
        }
    }

    #[tokio::test]
    async fn test_stream_skips_filtered_events_and_ends_when_closed() {
        let me = UserId::generate();
        let events = OrderEvents::new();
        let stream = order_event_stream(events.subscribe(), EventFilter::User(me));

        events.publish(changed(1, UserId::generate()));
        events.publish(changed(2, me));
        drop(events);

        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_stream_emits_resync_after_lag() {
        let events = OrderEvents::new();
        let rx = events.subscribe();
        let user = UserId::generate();
        for id in 0..300 {
            events.publish(changed(id, user));
        }
        drop(events);

        let stream = order_event_stream(rx, EventFilter::All);
        let items: Vec<_> = stream.collect().await;
        // One resync marker plus the events still buffered.
        assert_eq!(items.len(), 1 + 256);
    }
}
