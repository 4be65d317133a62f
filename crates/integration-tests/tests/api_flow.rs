//! HTTP tests against a running server.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`fo-cli migrate`)
//! - A seeded menu (`fo-cli seed`)
//! - The server running (`food-order-server`)

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use food_order_integration_tests::{
    base_url, first_product, session_client, signed_in_customer, unique_email,
};

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_health() {
    let resp = session_client()
        .get(format!("{}/health", base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_cart_requires_sign_in() {
    let resp = session_client()
        .get(format!("{}/api/cart", base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_sign_up_rejects_mismatched_passwords() {
    let resp = session_client()
        .post(format!("{}/auth/sign-up", base_url()))
        .json(&json!({
            "email": unique_email(),
            "password": "secret-pass",
            "confirm_password": "other-pass",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server with a seeded menu"]
async fn test_adding_same_product_and_size_merges_lines() {
    let client = signed_in_customer().await;
    let product = first_product(&client).await;
    let add = json!({ "product_id": product["id"], "size": "L" });

    for _ in 0..2 {
        let resp = client
            .post(format!("{}/api/cart/items", base_url()))
            .json(&add)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let cart: Value = client
        .get(format!("{}/api/cart", base_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let items = cart["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(cart["item_count"], 2);

    // Decrement twice: the line disappears.
    let item_id = items[0]["id"].as_str().unwrap().to_string();
    for _ in 0..2 {
        client
            .post(format!("{}/api/cart/items/{item_id}/quantity", base_url()))
            .json(&json!({ "amount": -1 }))
            .send()
            .await
            .unwrap();
    }
    let cart: Value = client
        .get(format!("{}/api/cart", base_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(cart["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_empty_cart_cannot_check_out() {
    let client = signed_in_customer().await;
    let resp = client
        .post(format!("{}/api/checkout", base_url()))
        .json(&json!({ "payment_intent_id": "pi_missing" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_customer_cannot_use_admin_routes() {
    let client = signed_in_customer().await;
    let resp = client
        .get(format!("{}/api/admin/orders", base_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running server"]
async fn test_password_reset_does_not_reveal_accounts() {
    let resp = session_client()
        .post(format!("{}/auth/forgot-password", base_url()))
        .json(&json!({ "email": unique_email() }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
