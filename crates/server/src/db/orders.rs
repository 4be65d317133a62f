//! Order and order item repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use food_order_core::{OrderId, OrderItemId, OrderLine, OrderStatus, PizzaSize, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Order, OrderDetail, OrderItemDetail, Product};
use crate::services::checkout::OrderWriter;

const ORDER_COLUMNS: &str = "id, user_id, total, status, created_at";

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    quantity: i32,
    size: PizzaSize,
    product_id: ProductId,
    product_name: String,
    product_image: Option<String>,
    product_price: Decimal,
    product_created_at: DateTime<Utc>,
}

impl From<OrderItemRow> for OrderItemDetail {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            quantity: row.quantity,
            size: row.size,
            product: Product {
                id: row.product_id,
                name: row.product_name,
                image: row.product_image,
                price: row.product_price,
                created_at: row.product_created_at,
            },
        }
    }
}

/// Repository for orders and their items.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Every order in the active queue (`archived = false`) or the archive
    /// (`archived = true`), newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_archived(&self, archived: bool) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE (status = 'Delivered') = $1
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(archived)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Get an order header by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// Get an order with its items and their products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_detail(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let Some(order) = self.get(id).await? else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT oi.id, oi.quantity, oi.size,
                   p.id AS product_id, p.name AS product_name, p.image AS product_image,
                   p.price AS product_price, p.created_at AS product_created_at
            FROM order_items oi
            JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            ORDER BY oi.id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(OrderItemDetail::from)
        .collect();

        Ok(Some(OrderDetail { order, items }))
    }

    /// Set an order's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = $2 WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}

impl OrderWriter for OrderRepository<'_> {
    async fn insert_order(
        &self,
        user_id: UserId,
        total: Decimal,
        payment_intent_id: &str,
    ) -> Result<Order, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders (user_id, total, payment_intent_id) VALUES ($1, $2, $3) \
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(total)
        .bind(payment_intent_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                RepositoryError::Conflict("payment intent already used".to_owned())
            }
            other => RepositoryError::Database(other),
        })?;

        Ok(order)
    }

    async fn insert_order_items(
        &self,
        order_id: OrderId,
        lines: &[OrderLine],
    ) -> Result<(), RepositoryError> {
        let product_ids: Vec<i32> = lines.iter().map(|l| l.product_id.as_i32()).collect();
        let quantities = lines
            .iter()
            .map(|l| {
                i32::try_from(l.quantity).map_err(|_| {
                    RepositoryError::Conflict(format!("quantity {} out of range", l.quantity))
                })
            })
            .collect::<Result<Vec<i32>, _>>()?;
        let sizes: Vec<&str> = lines.iter().map(|l| l.size.as_str()).collect();

        sqlx::query(
            r"
            INSERT INTO order_items (order_id, product_id, quantity, size)
            SELECT $1, item.product_id, item.quantity, item.size::pizza_size
            FROM UNNEST($2::int4[], $3::int4[], $4::text[]) AS item(product_id, quantity, size)
            ",
        )
        .bind(order_id)
        .bind(&product_ids)
        .bind(&quantities)
        .bind(&sizes)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "order item references a missing product"))?;

        Ok(())
    }
}
