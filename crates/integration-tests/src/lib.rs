//! Integration tests for Food Order.
//!
//! # Running Tests
//!
//! The in-process tests run with the rest of the workspace. The HTTP tests
//! are `#[ignore]`d and need a migrated database and a running server:
//!
//! ```bash
//! fo-cli migrate
//! food-order-server &
//! cargo test -p food-order-integration-tests -- --ignored
//! ```
//!
//! `FOOD_TEST_BASE_URL` overrides the server address (default
//! `http://localhost:3000`).

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("FOOD_TEST_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Client that keeps the session cookie between requests.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
pub fn session_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Email address no other test run has used.
#[must_use]
pub fn unique_email() -> String {
    format!("test-{}@example.com", Uuid::new_v4().simple())
}

/// Sign up a fresh customer and return a client holding their session.
///
/// # Panics
///
/// Panics if the server is unreachable or rejects the sign-up.
pub async fn signed_in_customer() -> Client {
    let client = session_client();
    let password = "secret-pass";
    let resp = client
        .post(format!("{}/auth/sign-up", base_url()))
        .json(&json!({
            "email": unique_email(),
            "password": password,
            "confirm_password": password,
            "full_name": "Test Customer",
        }))
        .send()
        .await
        .expect("Failed to sign up");

    assert_eq!(resp.status(), StatusCode::CREATED);
    client
}

/// First product on the menu.
///
/// # Panics
///
/// Panics if the menu is empty; run `fo-cli seed` first.
pub async fn first_product(client: &Client) -> Value {
    let products: Vec<Value> = client
        .get(format!("{}/api/products", base_url()))
        .send()
        .await
        .expect("Failed to list products")
        .json()
        .await
        .expect("Invalid product list");

    products
        .into_iter()
        .next()
        .expect("Menu is empty; run `fo-cli seed`")
}
