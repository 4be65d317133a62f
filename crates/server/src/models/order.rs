//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use food_order_core::{OrderId, OrderItemId, OrderStatus, PizzaSize, UserId};

use super::Product;

/// An order header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// One order line joined with the product it refers to.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemDetail {
    pub id: OrderItemId,
    pub quantity: i32,
    pub size: PizzaSize,
    pub product: Product,
}

/// An order with its lines, as shown on the order detail screens.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
}
