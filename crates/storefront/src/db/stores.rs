//! Store repository.
//!
//! Mutations take the acting vendor's id and only match stores that vendor
//! owns, so a non-owner sees the same result as a missing store.

use sqlx::PgPool;

use bazaar_core::{StoreId, UserId};

use super::RepositoryError;
use crate::models::Store;

/// Editable store fields.
#[derive(Debug, Clone)]
pub struct StoreInput {
    pub name: String,
    pub description: String,
}

pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Store>, RepositoryError> {
        let stores = sqlx::query_as::<_, Store>(
            r"
            SELECT id, owner_id, name, description, created_at
            FROM store
            ORDER BY created_at, id
            ",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(stores)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_owner(&self, owner_id: UserId) -> Result<Vec<Store>, RepositoryError> {
        let stores = sqlx::query_as::<_, Store>(
            r"
            SELECT id, owner_id, name, description, created_at
            FROM store
            WHERE owner_id = $1
            ORDER BY created_at, id
            ",
        )
        .bind(owner_id)
        .fetch_all(self.pool)
        .await?;
        Ok(stores)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let store = sqlx::query_as::<_, Store>(
            r"
            SELECT id, owner_id, name, description, created_at
            FROM store
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(store)
    }

    /// Fetch a store only if `owner_id` owns it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_owned(
        &self,
        id: StoreId,
        owner_id: UserId,
    ) -> Result<Option<Store>, RepositoryError> {
        let store = sqlx::query_as::<_, Store>(
            r"
            SELECT id, owner_id, name, description, created_at
            FROM store
            WHERE id = $1 AND owner_id = $2
            ",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(store)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, owner_id: UserId, input: &StoreInput) -> Result<Store, RepositoryError> {
        let store = sqlx::query_as::<_, Store>(
            r"
            INSERT INTO store (owner_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, owner_id, name, description, created_at
            ",
        )
        .bind(owner_id)
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(self.pool)
        .await?;
        Ok(store)
    }

    /// Update an owned store; `None` if it is missing or owned by someone else.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update_owned(
        &self,
        id: StoreId,
        owner_id: UserId,
        input: &StoreInput,
    ) -> Result<Option<Store>, RepositoryError> {
        let store = sqlx::query_as::<_, Store>(
            r"
            UPDATE store
            SET name = $3, description = $4
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, name, description, created_at
            ",
        )
        .bind(id)
        .bind(owner_id)
        .bind(&input.name)
        .bind(&input.description)
        .fetch_optional(self.pool)
        .await?;
        Ok(store)
    }

    /// Delete an owned store and, by cascade, its products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no owned store matched.
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_owned(&self, id: StoreId, owner_id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM store WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
