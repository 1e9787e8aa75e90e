//! Product repository.

use rust_decimal::Decimal;
use sqlx::PgPool;

use bazaar_core::{ProductId, StoreId, UserId};

use super::RepositoryError;
use crate::models::Product;

/// Editable product fields, already validated.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
}

pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_store(&self, store_id: StoreId) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(
            r"
            SELECT id, store_id, name, description, price, stock, created_at
            FROM product
            WHERE store_id = $1
            ORDER BY created_at, id
            ",
        )
        .bind(store_id)
        .fetch_all(self.pool)
        .await?;
        Ok(products)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r"
            SELECT id, store_id, name, description, price, stock, created_at
            FROM product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Fetch a product only if its store is owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_owned(
        &self,
        id: ProductId,
        owner_id: UserId,
    ) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r"
            SELECT p.id, p.store_id, p.name, p.description, p.price, p.stock, p.created_at
            FROM product p
            JOIN store s ON s.id = p.store_id
            WHERE p.id = $1 AND s.owner_id = $2
            ",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Callers must have checked that the store belongs to the acting vendor.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        store_id: StoreId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r"
            INSERT INTO product (store_id, name, description, price, stock)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, store_id, name, description, price, stock, created_at
            ",
        )
        .bind(store_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.stock)
        .fetch_one(self.pool)
        .await?;
        Ok(product)
    }

    /// Update a product whose store is owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update_owned(
        &self,
        id: ProductId,
        owner_id: UserId,
        input: &ProductInput,
    ) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r"
            UPDATE product p
            SET name = $3, description = $4, price = $5, stock = $6
            FROM store s
            WHERE p.id = $1 AND s.id = p.store_id AND s.owner_id = $2
            RETURNING p.id, p.store_id, p.name, p.description, p.price, p.stock, p.created_at
            ",
        )
        .bind(id)
        .bind(owner_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.stock)
        .fetch_optional(self.pool)
        .await?;
        Ok(product)
    }

    /// Delete a product whose store is owned by `owner_id`.
    ///
    /// Returns the id of the store the product belonged to.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no owned product matched.
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_owned(
        &self,
        id: ProductId,
        owner_id: UserId,
    ) -> Result<StoreId, RepositoryError> {
        sqlx::query_scalar::<_, StoreId>(
            r"
            DELETE FROM product p
            USING store s
            WHERE p.id = $1 AND s.id = p.store_id AND s.owner_id = $2
            RETURNING p.store_id
            ",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}
