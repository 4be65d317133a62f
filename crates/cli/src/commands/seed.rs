//! Seed the database with a demo menu.

use rust_decimal::Decimal;

use food_order_core::format_usd;
use food_order_server::db::{ProductRepository, products::ProductInput};

use super::connect;

/// Demo menu: name and price in cents.
const DEMO_MENU: &[(&str, i64)] = &[
    ("Ultimate Pepperoni", 1299),
    ("Margarita", 1099),
    ("Hawaiian", 1399),
    ("Veggie Supreme", 1249),
    ("Four Cheese", 1199),
    ("BBQ Chicken", 1449),
];

/// Insert the demo menu unless products already exist.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn menu() -> Result<(), Box<dyn std::error::Error>> {
    let pool = connect().await?;
    let products = ProductRepository::new(&pool);

    let existing = products.list().await?.len();
    if existing > 0 {
        tracing::info!(existing, "Menu already has products, skipping seed");
        return Ok(());
    }

    for (name, cents) in DEMO_MENU {
        let product = products
            .create(&ProductInput {
                name: (*name).to_string(),
                price: Decimal::new(*cents, 2),
                image: None,
            })
            .await?;
        tracing::info!(
            id = %product.id,
            name = %product.name,
            price = %format_usd(product.price),
            "Product created"
        );
    }

    tracing::info!(count = DEMO_MENU.len(), "Seeding complete!");
    Ok(())
}
