//! Product (menu) repository.

use rust_decimal::Decimal;
use sqlx::PgPool;

use food_order_core::ProductId;

use super::RepositoryError;
use crate::models::Product;

/// Fields written when creating or updating a product.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
}

/// Repository for menu products.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(
            r"
            SELECT id, name, image, price, created_at
            FROM products
            ORDER BY created_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, image, price, created_at FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r"
            INSERT INTO products (name, price, image)
            VALUES ($1, $2, $3)
            RETURNING id, name, image, price, created_at
            ",
        )
        .bind(&input.name)
        .bind(input.price)
        .bind(input.image.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(product)
    }

    /// Overwrite a product's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(
            r"
            UPDATE products
            SET name = $2, price = $3, image = $4
            WHERE id = $1
            RETURNING id, name, image, price, created_at
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.price)
        .bind(input.image.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if an order still references it.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::from_constraint(e, "product is part of an order"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
