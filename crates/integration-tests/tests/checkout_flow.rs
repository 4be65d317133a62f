//! In-process checkout flow: a cart built through the core API is placed
//! through `CheckoutService` with fake payment and storage backends.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;

use chrono::Utc;
use rust_decimal::Decimal;

use food_order_core::{
    Cart, CartProduct, OrderId, OrderLine, OrderStatus, PizzaSize, ProductId, QuantityChange,
    UserId,
};
use food_order_server::db::RepositoryError;
use food_order_server::models::Order;
use food_order_server::services::checkout::{
    CheckoutError, CheckoutRequest, CheckoutService, OrderWriter, PaymentGateway,
};
use food_order_server::services::payments::{PaymentError, PaymentIntent, check_intent};

/// Gateway answering with one canned intent.
struct CannedIntent(PaymentIntent);

impl PaymentGateway for CannedIntent {
    async fn verify_payment(
        &self,
        intent_id: &str,
        expected_amount: i64,
        customer_id: Option<&str>,
    ) -> Result<(), PaymentError> {
        assert_eq!(intent_id, self.0.id);
        check_intent(&self.0, expected_amount, customer_id)
    }
}

/// In-memory order storage.
#[derive(Default)]
struct MemoryOrders {
    orders: Mutex<Vec<(Order, String)>>,
    items: Mutex<Vec<(OrderId, OrderLine)>>,
    fail_items: bool,
}

impl OrderWriter for MemoryOrders {
    async fn insert_order(
        &self,
        user_id: UserId,
        total: Decimal,
        payment_intent_id: &str,
    ) -> Result<Order, RepositoryError> {
        let mut orders = self.orders.lock().unwrap();
        if orders.iter().any(|(_, intent)| intent == payment_intent_id) {
            return Err(RepositoryError::Conflict("payment intent already used".to_string()));
        }
        let order = Order {
            id: OrderId::new(i32::try_from(orders.len()).unwrap() + 1),
            user_id,
            total,
            status: OrderStatus::New,
            created_at: Utc::now(),
        };
        orders.push((order.clone(), payment_intent_id.to_string()));
        Ok(order)
    }

    async fn insert_order_items(
        &self,
        order_id: OrderId,
        lines: &[OrderLine],
    ) -> Result<(), RepositoryError> {
        if self.fail_items {
            return Err(RepositoryError::Conflict("product deleted".to_string()));
        }
        let mut items = self.items.lock().unwrap();
        items.extend(lines.iter().map(|line| (order_id, *line)));
        Ok(())
    }
}

fn product(id: i32, cents: i64) -> CartProduct {
    CartProduct {
        id: ProductId::new(id),
        name: format!("Pizza {id}"),
        price: Decimal::new(cents, 2),
        image: None,
    }
}

/// Two medium margheritas, one large pepperoni: 2 × 10.99 + 12.99 = 34.97.
fn sample_cart() -> Cart {
    let mut cart = Cart::new();
    let margherita = cart.add_item(product(1, 1099), PizzaSize::Medium);
    cart.add_item(product(2, 1299), PizzaSize::Large);
    cart.update_quantity(margherita, QuantityChange::Increment)
        .unwrap();
    cart
}

fn intent(amount: i64, status: &str) -> PaymentIntent {
    PaymentIntent {
        id: "pi_test_123".to_string(),
        amount,
        status: status.to_string(),
        customer: Some("cus_test".to_string()),
        client_secret: None,
    }
}

fn request(user_id: UserId) -> CheckoutRequest<'static> {
    CheckoutRequest {
        user_id,
        payment_intent_id: "pi_test_123",
        customer_id: Some("cus_test"),
    }
}

#[tokio::test]
async fn test_paid_cart_becomes_order_with_items() {
    let cart = sample_cart();
    assert_eq!(cart.total(), Decimal::new(3497, 2));

    let gateway = CannedIntent(intent(3497, "succeeded"));
    let storage = MemoryOrders::default();
    let user = UserId::generate();

    let order = CheckoutService::new(&gateway, &storage)
        .place_order(&cart, request(user))
        .await
        .unwrap();

    assert_eq!(order.user_id, user);
    assert_eq!(order.total, Decimal::new(3497, 2));
    assert_eq!(order.status, OrderStatus::New);

    let items = storage.items.lock().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|(order_id, _)| *order_id == order.id));
    let quantities: u32 = items.iter().map(|(_, line)| line.quantity).sum();
    assert_eq!(quantities, 3);
}

#[tokio::test]
async fn test_underpaid_intent_writes_nothing() {
    let gateway = CannedIntent(intent(1099, "succeeded"));
    let storage = MemoryOrders::default();

    let err = CheckoutService::new(&gateway, &storage)
        .place_order(&sample_cart(), request(UserId::generate()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::Payment(PaymentError::AmountMismatch { .. })
    ));
    assert!(storage.orders.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unconfirmed_intent_is_rejected() {
    let gateway = CannedIntent(intent(3497, "requires_payment_method"));
    let storage = MemoryOrders::default();

    let err = CheckoutService::new(&gateway, &storage)
        .place_order(&sample_cart(), request(UserId::generate()))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CheckoutError::Payment(PaymentError::NotAuthorized(_))
    ));
}

#[tokio::test]
async fn test_item_failure_reports_the_written_order() {
    let gateway = CannedIntent(intent(3497, "succeeded"));
    let storage = MemoryOrders {
        fail_items: true,
        ..MemoryOrders::default()
    };

    let err = CheckoutService::new(&gateway, &storage)
        .place_order(&sample_cart(), request(UserId::generate()))
        .await
        .unwrap_err();

    let CheckoutError::CreateOrderItems { order_id, .. } = err else {
        panic!("expected CreateOrderItems, got {err:?}");
    };
    assert_eq!(order_id, OrderId::new(1));
    assert_eq!(storage.orders.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_payment_intent_pays_for_one_order() {
    let gateway = CannedIntent(intent(3497, "succeeded"));
    let storage = MemoryOrders::default();
    let user = UserId::generate();
    let service = CheckoutService::new(&gateway, &storage);

    let mut placed = 0;
    for _ in 0..3 {
        if service.place_order(&sample_cart(), request(user)).await.is_ok() {
            placed += 1;
        }
    }

    assert_eq!(placed, 1);
    let err = service
        .place_order(&sample_cart(), request(user))
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::PaymentAlreadyUsed(ref id) if id == "pi_test_123"));
    assert_eq!(storage.orders.lock().unwrap().len(), 1);
    assert_eq!(storage.items.lock().unwrap().len(), 2);
}
