//! Menu product.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use food_order_core::{CartProduct, ProductId};

/// A menu product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Image path relative to the image store, if any.
    pub image: Option<String>,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Snapshot used when adding the product to a cart.
    #[must_use]
    pub fn to_cart_product(&self) -> CartProduct {
        CartProduct {
            id: self.id,
            name: self.name.clone(),
            price: self.price,
            image: self.image.clone(),
        }
    }
}
