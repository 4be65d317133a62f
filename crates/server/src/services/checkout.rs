//! Checkout: turn a paid cart into an order.
//!
//! The steps run strictly in sequence and stop at the first failure:
//!
//! 1. confirm the payment was authorized for the cart total;
//! 2. write the order row, claiming the payment intent;
//! 3. write one order item row per cart line.
//!
//! An intent stays authorized at the provider after it has paid, so the
//! order row stores its ID under a unique constraint and a second order for
//! the same intent is refused.
//!
//! Nothing here clears the cart. The caller does that only when
//! [`CheckoutService::place_order`] returns `Ok`, so any failure leaves the
//! customer's cart intact for a retry.

use std::future::Future;

use rust_decimal::Decimal;
use thiserror::Error;

use food_order_core::{Cart, MoneyError, OrderId, OrderLine, UserId, to_minor_units};

use crate::db::RepositoryError;
use crate::models::Order;
use crate::services::payments::PaymentError;

/// Confirms a payment before an order is written.
pub trait PaymentGateway {
    /// Succeeds only if `intent_id` is authorized for exactly
    /// `expected_amount` minor units and belongs to `customer_id`.
    fn verify_payment(
        &self,
        intent_id: &str,
        expected_amount: i64,
        customer_id: Option<&str>,
    ) -> impl Future<Output = Result<(), PaymentError>> + Send;
}

/// Persists orders and their items.
pub trait OrderWriter {
    /// Writes the order row.
    ///
    /// Fails with [`RepositoryError::Conflict`] if an order already exists
    /// for `payment_intent_id`.
    fn insert_order(
        &self,
        user_id: UserId,
        total: Decimal,
        payment_intent_id: &str,
    ) -> impl Future<Output = Result<Order, RepositoryError>> + Send;

    fn insert_order_items(
        &self,
        order_id: OrderId,
        lines: &[OrderLine],
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Errors from checkout, one per step.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("invalid cart total: {0}")]
    Total(#[from] MoneyError),

    #[error("payment failed: {0}")]
    Payment(#[source] PaymentError),

    #[error("payment {0} has already been used for an order")]
    PaymentAlreadyUsed(String),

    #[error("failed to create order: {0}")]
    CreateOrder(#[source] RepositoryError),

    #[error("failed to create items for order {order_id}: {source}")]
    CreateOrderItems {
        order_id: OrderId,
        #[source]
        source: RepositoryError,
    },
}

/// Who is checking out and with which payment.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutRequest<'a> {
    pub user_id: UserId,
    pub payment_intent_id: &'a str,
    /// Payment provider customer stored on the user's profile.
    pub customer_id: Option<&'a str>,
}

/// Checkout service.
pub struct CheckoutService<'a, P, W> {
    payments: &'a P,
    orders: &'a W,
}

impl<'a, P: PaymentGateway + Sync, W: OrderWriter + Sync> CheckoutService<'a, P, W> {
    #[must_use]
    pub const fn new(payments: &'a P, orders: &'a W) -> Self {
        Self { payments, orders }
    }

    /// Place an order for everything in `cart`.
    ///
    /// # Errors
    ///
    /// Returns the error of the first step that failed. No later step runs.
    pub async fn place_order(
        &self,
        cart: &Cart,
        request: CheckoutRequest<'_>,
    ) -> Result<Order, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let total = cart.total();
        let amount = to_minor_units(total)?;

        self.payments
            .verify_payment(request.payment_intent_id, amount, request.customer_id)
            .await
            .map_err(CheckoutError::Payment)?;

        let order = self
            .orders
            .insert_order(request.user_id, total, request.payment_intent_id)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => {
                    tracing::warn!(
                        user_id = %request.user_id,
                        payment_intent_id = request.payment_intent_id,
                        "Payment intent reused"
                    );
                    CheckoutError::PaymentAlreadyUsed(request.payment_intent_id.to_owned())
                }
                other => CheckoutError::CreateOrder(other),
            })?;

        if let Err(source) = self
            .orders
            .insert_order_items(order.id, &cart.order_lines())
            .await
        {
            tracing::error!(order_id = %order.id, error = %source, "Order written without items");
            return Err(CheckoutError::CreateOrderItems {
                order_id: order.id,
                source,
            });
        }

        tracing::info!(
            order_id = %order.id,
            user_id = %request.user_id,
            total = %total,
            "Order placed"
        );

        Ok(order)
    }
}
