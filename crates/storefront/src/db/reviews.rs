//! Review repository.

use sqlx::PgPool;

use bazaar_core::{ProductId, Rating, UserId};

use super::RepositoryError;
use crate::models::Review;

pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reviews for a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Review>, RepositoryError> {
        let reviews = sqlx::query_as::<_, Review>(
            r"
            SELECT r.id, r.product_id, r.reviewer_id, u.username AS reviewer_username,
                   r.rating, r.comment, r.is_verified, r.created_at
            FROM review r
            JOIN app_user u ON u.id = r.reviewer_id
            WHERE r.product_id = $1
            ORDER BY r.created_at DESC, r.id DESC
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;
        Ok(reviews)
    }

    /// Insert a review, deciding the verified flag in the same statement.
    ///
    /// The review is verified iff the reviewer has an order line for the
    /// product at this moment. The flag is never recomputed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        product_id: ProductId,
        reviewer_id: UserId,
        rating: Rating,
        comment: &str,
    ) -> Result<Review, RepositoryError> {
        let review = sqlx::query_as::<_, Review>(
            r"
            WITH inserted AS (
                INSERT INTO review (product_id, reviewer_id, rating, comment, is_verified)
                VALUES ($1, $2, $3, $4, EXISTS (
                    SELECT 1
                    FROM order_item oi
                    JOIN customer_order o ON o.id = oi.order_id
                    WHERE o.buyer_id = $2 AND oi.product_id = $1
                ))
                RETURNING id, product_id, reviewer_id, rating, comment, is_verified, created_at
            )
            SELECT i.id, i.product_id, i.reviewer_id, u.username AS reviewer_username,
                   i.rating, i.comment, i.is_verified, i.created_at
            FROM inserted i
            JOIN app_user u ON u.id = i.reviewer_id
            ",
        )
        .bind(product_id)
        .bind(reviewer_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(self.pool)
        .await?;
        Ok(review)
    }
}
