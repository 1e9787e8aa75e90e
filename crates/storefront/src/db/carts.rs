//! Persisted buyer carts.
//!
//! A cart row is live until `expires_at`; expired rows read as absent and are
//! swept by `bazaar carts purge`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use bazaar_core::{Cart, UserId};

use super::RepositoryError;

pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn load(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<Cart>, RepositoryError> {
        let contents: Option<Json<Cart>> = sqlx::query_scalar(
            r"
            SELECT contents
            FROM cart
            WHERE user_id = $1 AND expires_at > $2
            ",
        )
        .bind(user_id)
        .bind(now)
        .fetch_optional(self.pool)
        .await?;
        Ok(contents.map(|Json(cart)| cart))
    }

    /// Insert or replace the cart and push its expiry out.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn save(
        &self,
        user_id: UserId,
        cart: &Cart,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO cart (user_id, contents, updated_at, expires_at)
            VALUES ($1, $2, now(), $3)
            ON CONFLICT (user_id) DO UPDATE
            SET contents = EXCLUDED.contents,
                updated_at = EXCLUDED.updated_at,
                expires_at = EXCLUDED.expires_at
            ",
        )
        .bind(user_id)
        .bind(Json(cart))
        .bind(expires_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart WHERE expires_at <= $1")
            .bind(now)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
