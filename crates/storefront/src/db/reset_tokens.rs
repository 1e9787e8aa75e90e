//! Password reset token storage.
//!
//! Tokens are looked up by their SHA-256 hex digest; the raw token only ever
//! exists in the emailed link.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use bazaar_core::{ResetTokenId, UserId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::ResetToken;

#[derive(FromRow)]
struct ResetTokenRow {
    id: ResetTokenId,
    user_id: UserId,
    expires_at: DateTime<Utc>,
    used: bool,
    created_at: DateTime<Utc>,
}

impl From<ResetTokenRow> for ResetToken {
    fn from(row: ResetTokenRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            expires_at: row.expires_at,
            used: row.used,
            created_at: row.created_at,
        }
    }
}

pub struct ResetTokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ResetTokenRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a digest collision.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        user_id: UserId,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<ResetToken, RepositoryError> {
        let row = sqlx::query_as::<_, ResetTokenRow>(
            r"
            INSERT INTO reset_token (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, expires_at, used, created_at
            ",
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "reset token"))?;

        Ok(row.into())
    }

    /// Find an unused token by digest, expired or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_unused(&self, token_hash: &str) -> Result<Option<ResetToken>, RepositoryError> {
        let row = sqlx::query_as::<_, ResetTokenRow>(
            r"
            SELECT id, user_id, expires_at, used, created_at
            FROM reset_token
            WHERE token_hash = $1 AND used = FALSE
            ",
        )
        .bind(token_hash)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(ResetToken::from))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ResetTokenId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM reset_token WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Set the account's new password and delete the token, atomically.
    ///
    /// The token row is deleted first; if it is already gone (consumed by a
    /// concurrent request) nothing is changed and `NotFound` is returned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the token was already consumed.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn consume(
        &self,
        token: &ResetToken,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query("DELETE FROM reset_token WHERE id = $1 AND used = FALSE")
            .bind(token.id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            r"
            UPDATE app_user
            SET password_hash = $2, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(token.user_id)
        .bind(password_hash)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Remove every token that expired before `now`. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM reset_token WHERE expires_at < $1")
            .bind(now)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
