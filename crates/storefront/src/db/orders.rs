//! Order repository and the checkout transaction.

use std::collections::HashMap;

use sqlx::PgPool;

use bazaar_core::{
    Cart, OrderId, OrderItemId, ProductId, SkippedLine, StockLevel, UserId, checkout::settle,
};

use super::RepositoryError;
use crate::models::{Order, OrderItem, Product};

/// What a committed checkout produced.
#[derive(Debug, Clone)]
pub struct CheckoutRecord {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub skipped: Vec<SkippedLine>,
}

pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turn `cart` into an order for `buyer_id` in a single transaction.
    ///
    /// The cart's products are locked (`FOR UPDATE`, in id order) before any
    /// stock decision is made, so concurrent checkouts for the same product
    /// serialize and stock can never go negative. Lines that cannot be
    /// fulfilled are skipped and reported; the order is created even when
    /// every line is skipped. The caller must reject empty carts beforehand.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a guarded stock update fails.
    /// Returns `RepositoryError::Database` if any statement fails; nothing
    /// is committed in either case.
    pub async fn place(
        &self,
        buyer_id: UserId,
        cart: &Cart,
    ) -> Result<CheckoutRecord, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order_id: OrderId = sqlx::query_scalar(
            r"
            INSERT INTO customer_order (buyer_id, total_price)
            VALUES ($1, 0)
            RETURNING id
            ",
        )
        .bind(buyer_id)
        .fetch_one(&mut *tx)
        .await?;

        let product_ids: Vec<i32> = cart
            .lines()
            .iter()
            .map(|line| line.product_id.as_i32())
            .collect();
        let locked = sqlx::query_as::<_, Product>(
            r"
            SELECT id, store_id, name, description, price, stock, created_at
            FROM product
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            ",
        )
        .bind(&product_ids)
        .fetch_all(&mut *tx)
        .await?;

        let levels: HashMap<ProductId, StockLevel> = locked
            .iter()
            .map(|product| (product.id, product.stock_level()))
            .collect();
        let settlement = settle(cart, &levels);
        if settlement.is_fully_skipped() {
            tracing::warn!(order_id = %order_id, "no cart line could be filled; order will be empty");
        }

        let mut items = Vec::with_capacity(settlement.items.len());
        for item in &settlement.items {
            let quantity = i32::try_from(item.quantity).map_err(|_| {
                RepositoryError::DataCorruption(format!("quantity {} out of range", item.quantity))
            })?;

            let updated = sqlx::query(
                r"
                UPDATE product
                SET stock = stock - $2
                WHERE id = $1 AND stock >= $2
                ",
            )
            .bind(item.product_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;
            if updated.rows_affected() != 1 {
                return Err(RepositoryError::Conflict(format!(
                    "stock for product {} changed during checkout",
                    item.product_id
                )));
            }

            let id: OrderItemId = sqlx::query_scalar(
                r"
                INSERT INTO order_item (order_id, product_id, quantity, price_at_purchase)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                ",
            )
            .bind(order_id)
            .bind(item.product_id)
            .bind(quantity)
            .bind(item.unit_price)
            .fetch_one(&mut *tx)
            .await?;

            items.push(OrderItem {
                id,
                order_id,
                product_id: item.product_id,
                product_name: item.name.clone(),
                quantity,
                price_at_purchase: item.unit_price,
            });
        }

        let order = sqlx::query_as::<_, Order>(
            r"
            UPDATE customer_order
            SET total_price = (
                SELECT COALESCE(SUM(quantity * price_at_purchase), 0)
                FROM order_item
                WHERE order_id = $1
            )
            WHERE id = $1
            RETURNING id, buyer_id, total_price, created_at
            ",
        )
        .bind(order_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(CheckoutRecord {
            order,
            items,
            skipped: settlement.skipped,
        })
    }

    /// Whether `buyer_id` has any order line for `product_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_purchased(
        &self,
        buyer_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let purchased: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1
                FROM order_item oi
                JOIN customer_order o ON o.id = oi.order_id
                WHERE o.buyer_id = $1 AND oi.product_id = $2
            )
            ",
        )
        .bind(buyer_id)
        .bind(product_id)
        .fetch_one(self.pool)
        .await?;
        Ok(purchased)
    }
}
