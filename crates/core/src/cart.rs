//! Shopping cart state machine.
//!
//! A [`Cart`] is an ordered list of line items keyed by `(product id, size)`.
//! It is not persisted as rows: the server keeps it in the customer's session
//! until checkout turns it into an order and its order items.
//!
//! Invariants maintained by every operation:
//! - no two items share the same `(product id, size)` key;
//! - every item has a quantity of at least 1;
//! - [`Cart::total`] equals the sum of `unit price × quantity` over all items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CartItemId, PizzaSize, ProductId};

/// Errors from cart operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// No line item with this ID is in the cart.
    #[error("cart item not found: {0}")]
    ItemNotFound(CartItemId),
}

/// Snapshot of the product a line item refers to.
///
/// Captured when the product is first added so the cart can be priced and
/// displayed without another menu lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
}

/// A selected product, size and quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub product: CartProduct,
    pub size: PizzaSize,
    pub quantity: u32,
}

impl CartItem {
    /// Unit price × quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }

    fn matches(&self, product_id: ProductId, size: PizzaSize) -> bool {
        self.product.id == product_id && self.size == size
    }
}

/// A `+1` / `-1` adjustment to one line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityChange {
    Increment,
    Decrement,
}

impl QuantityChange {
    /// Map the `1` / `-1` amount used by clients.
    #[must_use]
    pub const fn from_amount(amount: i8) -> Option<Self> {
        match amount {
            1 => Some(Self::Increment),
            -1 => Some(Self::Decrement),
            _ => None,
        }
    }
}

/// One order item to be written at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub size: PizzaSize,
}

/// The customer's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Items, most recently added first.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add one unit of `product` in `size`.
    ///
    /// If a line for the same product and size exists its quantity goes up by
    /// one; otherwise a new line with quantity 1 is placed at the front.
    /// Returns the ID of the affected line.
    pub fn add_item(&mut self, product: CartProduct, size: PizzaSize) -> CartItemId {
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|item| item.matches(product.id, size))
        {
            existing.quantity = existing.quantity.saturating_add(1);
            return existing.id;
        }

        let item = CartItem {
            id: CartItemId::generate(),
            product,
            size,
            quantity: 1,
        };
        let id = item.id;
        self.items.insert(0, item);
        id
    }

    /// Apply a `+1` / `-1` change to one line, dropping it when it reaches 0.
    ///
    /// Returns the line's new quantity (0 when it was removed).
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if no line has `item_id`.
    pub fn update_quantity(
        &mut self,
        item_id: CartItemId,
        change: QuantityChange,
    ) -> Result<u32, CartError> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or(CartError::ItemNotFound(item_id))?;

        item.quantity = match change {
            QuantityChange::Increment => item.quantity.saturating_add(1),
            QuantityChange::Decrement => item.quantity.saturating_sub(1),
        };
        let quantity = item.quantity;

        self.items.retain(|item| item.quantity > 0);
        Ok(quantity)
    }

    /// Sum of every line total.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |count, item| count.saturating_add(item.quantity))
    }

    /// Order items to write for this cart, in cart order.
    #[must_use]
    pub fn order_lines(&self) -> Vec<OrderLine> {
        self.items
            .iter()
            .map(|item| OrderLine {
                product_id: item.product.id,
                quantity: item.quantity,
                size: item.size,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn product(id: i32, cents: i64) -> CartProduct {
        CartProduct {
            id: ProductId::new(id),
            name: format!("Pizza {id}"),
            price: Decimal::new(cents, 2),
            image: None,
        }
    }

    #[test]
    fn test_add_new_item_is_prepended() {
        let mut cart = Cart::new();
        cart.add_item(product(1, 1299), PizzaSize::Medium);
        cart.add_item(product(2, 999), PizzaSize::Medium);

        let ids: Vec<i32> = cart.items().iter().map(|i| i.product.id.as_i32()).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(cart.items().iter().all(|i| i.quantity == 1));
    }

    #[test]
    fn test_add_same_product_and_size_merges() {
        let mut cart = Cart::new();
        let first = cart.add_item(product(1, 1299), PizzaSize::Large);
        cart.add_item(product(2, 500), PizzaSize::Large);
        let second = cart.add_item(product(1, 1299), PizzaSize::Large);

        assert_eq!(first, second);
        assert_eq!(cart.items().len(), 2);
        // Merging does not move the line.
        assert_eq!(cart.items()[1].id, first);
        assert_eq!(cart.items()[1].quantity, 2);
    }

    #[test]
    fn test_same_product_different_size_is_separate_line() {
        let mut cart = Cart::new();
        let small = cart.add_item(product(1, 1299), PizzaSize::Small);
        let xl = cart.add_item(product(1, 1299), PizzaSize::ExtraLarge);

        assert_ne!(small, xl);
        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_update_quantity_increments_and_decrements() {
        let mut cart = Cart::new();
        let id = cart.add_item(product(1, 1000), PizzaSize::Medium);

        assert_eq!(cart.update_quantity(id, QuantityChange::Increment).unwrap(), 2);
        assert_eq!(cart.update_quantity(id, QuantityChange::Decrement).unwrap(), 1);
        assert_eq!(cart.items()[0].quantity, 1);
    }

    #[test]
    fn test_decrement_to_zero_removes_line() {
        let mut cart = Cart::new();
        let keep = cart.add_item(product(1, 1000), PizzaSize::Medium);
        let drop = cart.add_item(product(2, 1000), PizzaSize::Medium);

        assert_eq!(cart.update_quantity(drop, QuantityChange::Decrement).unwrap(), 0);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].id, keep);
    }

    #[test]
    fn test_update_unknown_item() {
        let mut cart = Cart::new();
        cart.add_item(product(1, 1000), PizzaSize::Medium);
        let missing = CartItemId::generate();

        assert_eq!(
            cart.update_quantity(missing, QuantityChange::Increment),
            Err(CartError::ItemNotFound(missing))
        );
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_total_is_sum_of_lines() {
        let mut cart = Cart::new();
        assert_eq!(cart.total(), Decimal::ZERO);

        let a = cart.add_item(product(1, 1299), PizzaSize::Medium);
        cart.add_item(product(2, 850), PizzaSize::Small);
        cart.update_quantity(a, QuantityChange::Increment).unwrap();
        cart.update_quantity(a, QuantityChange::Increment).unwrap();

        // 3 × 12.99 + 1 × 8.50
        assert_eq!(cart.total(), Decimal::new(4747, 2));
        assert_eq!(cart.item_count(), 4);
    }

    #[test]
    fn test_order_lines_follow_cart_order() {
        let mut cart = Cart::new();
        cart.add_item(product(1, 1000), PizzaSize::Small);
        cart.add_item(product(2, 1000), PizzaSize::Large);
        cart.add_item(product(1, 1000), PizzaSize::Small);

        let lines = cart.order_lines();
        assert_eq!(
            lines,
            vec![
                OrderLine {
                    product_id: ProductId::new(2),
                    quantity: 1,
                    size: PizzaSize::Large,
                },
                OrderLine {
                    product_id: ProductId::new(1),
                    quantity: 2,
                    size: PizzaSize::Small,
                },
            ]
        );
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add_item(product(1, 1000), PizzaSize::Medium);
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn test_cart_survives_session_serialization() {
        let mut cart = Cart::new();
        cart.add_item(product(3, 1450), PizzaSize::ExtraLarge);

        let json = serde_json::to_value(&cart).unwrap();
        let restored: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(restored, cart);
        assert_eq!(restored.total(), Decimal::new(1450, 2));
    }

    #[test]
    fn test_quantity_change_from_amount() {
        assert_eq!(QuantityChange::from_amount(1), Some(QuantityChange::Increment));
        assert_eq!(QuantityChange::from_amount(-1), Some(QuantityChange::Decrement));
        assert_eq!(QuantityChange::from_amount(2), None);
    }
}
