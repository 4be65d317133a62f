//! Menu service: product reads through a `moka` cache, admin writes with
//! validation and cache invalidation.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, instrument};

use food_order_core::{ProductId, format_usd};

use crate::db::RepositoryError;
use crate::db::products::{ProductInput, ProductRepository};
use crate::models::Product;

/// Longest accepted product name.
const MAX_NAME_LENGTH: usize = 120;

/// Prices must stay below this many dollars to fit `NUMERIC(10, 2)`.
const PRICE_LIMIT: i64 = 100_000_000;

/// Cache key for menu reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Menu,
    Product(ProductId),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Menu(Arc<Vec<Product>>),
    Product(Box<Product>),
}

/// Shared menu cache (5-minute TTL).
#[derive(Clone)]
pub struct MenuCache {
    cache: Cache<CacheKey, CacheValue>,
}

impl Default for MenuCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MenuCache {
    #[must_use]
    pub fn new() -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();
        Self { cache }
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}

/// Errors from menu operations.
#[derive(Debug, Error)]
pub enum MenuError {
    #[error("{0}")]
    Validation(String),

    #[error("product not found")]
    NotFound,

    #[error("product is part of an existing order")]
    InUse,

    #[error("database error: {0}")]
    Repository(#[source] RepositoryError),
}

impl From<RepositoryError> for MenuError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::Conflict(_) => Self::InUse,
            other => Self::Repository(other),
        }
    }
}

/// Unvalidated product fields from the admin form.
#[derive(Debug, Clone, Default)]
pub struct ProductDraft {
    pub name: String,
    pub price: Option<Decimal>,
    pub image: Option<String>,
}

impl ProductDraft {
    /// Validate the form: a name and a non-negative price that fits the
    /// `products.price` column are required.
    ///
    /// # Errors
    ///
    /// Returns `MenuError::Validation` describing the first problem found.
    pub fn validate(self) -> Result<ProductInput, MenuError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(MenuError::Validation("Name is required".into()));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(MenuError::Validation(format!(
                "Name must be at most {MAX_NAME_LENGTH} characters"
            )));
        }

        let price = self
            .price
            .ok_or_else(|| MenuError::Validation("Price is required".into()))?;
        // `-0` compares equal to zero and is accepted as zero.
        if price < Decimal::ZERO {
            return Err(MenuError::Validation("Price must not be negative".into()));
        }
        if price.scale() > 2 && price.round_dp(2) != price {
            return Err(MenuError::Validation("Price must have at most 2 decimals".into()));
        }
        if price >= Decimal::from(PRICE_LIMIT) {
            return Err(MenuError::Validation(format!(
                "Price must be less than {}",
                format_usd(Decimal::from(PRICE_LIMIT))
            )));
        }
        let price = if price.is_zero() {
            Decimal::ZERO
        } else {
            price.round_dp(2)
        };

        Ok(ProductInput {
            name: name.to_owned(),
            price,
            image: self.image.filter(|i| !i.trim().is_empty()),
        })
    }
}

/// Menu service.
pub struct MenuService<'a> {
    products: ProductRepository<'a>,
    cache: &'a MenuCache,
}

impl<'a> MenuService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, cache: &'a MenuCache) -> Self {
        Self {
            products: ProductRepository::new(pool),
            cache,
        }
    }

    /// All products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `MenuError::Repository` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Arc<Vec<Product>>, MenuError> {
        if let Some(CacheValue::Menu(menu)) = self.cache.cache.get(&CacheKey::Menu).await {
            debug!("Cache hit for menu");
            return Ok(menu);
        }

        let menu = Arc::new(self.products.list().await?);
        self.cache
            .cache
            .insert(CacheKey::Menu, CacheValue::Menu(Arc::clone(&menu)))
            .await;
        Ok(menu)
    }

    /// One product.
    ///
    /// # Errors
    ///
    /// Returns `MenuError::NotFound` if there is no such product.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get(&self, id: ProductId) -> Result<Product, MenuError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.cache.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product = self.products.get(id).await?.ok_or(MenuError::NotFound)?;
        self.cache
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// Add a product to the menu.
    ///
    /// # Errors
    ///
    /// Returns `MenuError::Validation` for bad input.
    #[instrument(skip(self, draft))]
    pub async fn create(&self, draft: ProductDraft) -> Result<Product, MenuError> {
        let input = draft.validate()?;
        let product = self.products.create(&input).await?;
        self.cache.invalidate_all().await;

        tracing::info!(product_id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Replace a product's fields.
    ///
    /// # Errors
    ///
    /// Returns `MenuError::Validation` for bad input, `MenuError::NotFound`
    /// if there is no such product.
    #[instrument(skip(self, draft), fields(product_id = %id))]
    pub async fn update(&self, id: ProductId, draft: ProductDraft) -> Result<Product, MenuError> {
        let input = draft.validate()?;
        let product = self.products.update(id, &input).await?;
        self.cache.invalidate_all().await;

        tracing::info!(product_id = %product.id, "Product updated");
        Ok(product)
    }

    /// Remove a product from the menu.
    ///
    /// # Errors
    ///
    /// Returns `MenuError::NotFound` if there is no such product and
    /// `MenuError::InUse` if an order references it.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: ProductId) -> Result<(), MenuError> {
        self.products.delete(id).await?;
        self.cache.invalidate_all().await;

        tracing::info!(product_id = %id, "Product deleted");
        Ok(())
    }
}
