//! HTTP route handlers for the customer and admin apps.
//!
//! # Route Structure
//!
//! ```text
//! # Auth (rate limited)
//! POST   /auth/sign-up              - Create an account and sign in
//! POST   /auth/sign-in              - Email/password sign-in
//! POST   /auth/sign-out             - End the session
//! POST   /auth/forgot-password      - Email a 6-digit reset code
//! POST   /auth/verify-reset-code    - Check a reset code
//! POST   /auth/reset-password       - Set a new password with a reset code
//!
//! # Profile (requires auth)
//! GET    /api/profile               - Current profile
//! PUT    /api/profile               - Update name and avatar
//! PUT    /api/profile/push-token    - Register or clear the device push token
//!
//! # Menu
//! GET    /api/products              - Product list, newest first
//! POST   /api/products              - Create product (admin)
//! POST   /api/products/images       - Upload product image (admin, multipart)
//! GET    /api/products/{id}         - Product detail
//! PUT    /api/products/{id}         - Update product (admin)
//! DELETE /api/products/{id}         - Delete product (admin)
//!
//! # Cart (session-backed)
//! GET    /api/cart                  - Cart with total
//! DELETE /api/cart                  - Empty the cart
//! POST   /api/cart/items            - Add a product in a size
//! POST   /api/cart/items/{id}/quantity - Change a line quantity by +1 or -1
//!
//! # Checkout
//! POST   /api/payment-sheet         - Prepare the payment sheet for the cart
//! POST   /api/checkout              - Place the order
//!
//! # Orders
//! GET    /api/orders                - My orders
//! GET    /api/orders/events         - Order change feed (SSE)
//! GET    /api/orders/{id}           - Order detail (owner or admin)
//! GET    /api/orders/{id}/events    - One order's status feed (SSE)
//!
//! # Admin
//! GET    /api/admin/orders?archived - Active queue or archive
//! PATCH  /api/admin/orders/{id}/status - Move an order to a new status
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod events;
pub mod orders;
pub mod products;
pub mod profile;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Room for multipart boundaries and headers on top of the image itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-up", post(auth::sign_up))
        .route("/sign-in", post(auth::sign_in))
        .route("/sign-out", post(auth::sign_out))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/verify-reset-code", post(auth::verify_reset_code))
        .route("/reset-password", post(auth::reset_password))
        .layer(auth_rate_limiter())
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::show).put(profile::update))
        .route("/push-token", put(profile::set_push_token))
}

/// Create the product routes router.
///
/// Uploads may carry up to `max_image_bytes` of image data.
pub fn product_routes(max_image_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/images",
            post(products::upload_image)
                .layer(DefaultBodyLimit::max(max_image_bytes + MULTIPART_OVERHEAD_BYTES)),
        )
        .route(
            "/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add_item))
        .route("/items/{id}/quantity", post(cart::update_quantity))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/events", get(orders::events))
        .route("/{id}", get(orders::show))
        .route("/{id}/events", get(orders::order_events))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(admin::list_orders))
        .route("/orders/{id}/status", patch(admin::update_status))
}

/// Create all JSON API routes.
pub fn routes(max_image_bytes: usize) -> Router<AppState> {
    let api = Router::new()
        .nest("/profile", profile_routes())
        .nest("/products", product_routes(max_image_bytes))
        .nest("/cart", cart_routes())
        .route("/payment-sheet", post(checkout::payment_sheet))
        .route("/checkout", post(checkout::checkout))
        .nest("/orders", order_routes())
        .nest("/admin", admin_routes())
        .layer(api_rate_limiter());

    Router::new()
        .nest("/auth", auth_routes())
        .nest("/api", api)
}
