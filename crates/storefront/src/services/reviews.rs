//! Review submission.

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use bazaar_core::{ProductId, Rating, RatingError, UserId};

use crate::db::{OrderRepository, ProductRepository, RepositoryError, ReviewRepository};
use crate::models::{Product, Review};

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Product not found")]
    ProductNotFound,

    #[error("Rating must be between 1 and 5")]
    InvalidRating(#[from] RatingError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub struct ReviewService<'a> {
    products: ProductRepository<'a>,
    orders: OrderRepository<'a>,
    reviews: ReviewRepository<'a>,
}

impl<'a> ReviewService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            products: ProductRepository::new(pool),
            orders: OrderRepository::new(pool),
            reviews: ReviewRepository::new(pool),
        }
    }

    /// The product and whether `reviewer_id` has bought it.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::ProductNotFound` for an unknown product.
    pub async fn prepare(
        &self,
        product_id: ProductId,
        reviewer_id: UserId,
    ) -> Result<(Product, bool), ReviewError> {
        let product = self
            .products
            .get(product_id)
            .await?
            .ok_or(ReviewError::ProductNotFound)?;
        let purchased = self.orders.has_purchased(reviewer_id, product_id).await?;
        Ok((product, purchased))
    }

    /// Record a review. The verified flag reflects purchases at this moment
    /// and is never revisited.
    ///
    /// # Errors
    ///
    /// Returns `ReviewError::InvalidRating` for a rating outside 1..=5 and
    /// `ReviewError::ProductNotFound` for an unknown product.
    #[instrument(skip(self, comment))]
    pub async fn submit(
        &self,
        product_id: ProductId,
        reviewer_id: UserId,
        rating: i64,
        comment: &str,
    ) -> Result<(Product, Review), ReviewError> {
        let rating = Rating::new(rating)?;
        let product = self
            .products
            .get(product_id)
            .await?
            .ok_or(ReviewError::ProductNotFound)?;

        let review = self
            .reviews
            .create(product_id, reviewer_id, rating, comment.trim())
            .await?;
        tracing::info!(
            review_id = %review.id,
            verified = review.is_verified,
            "review submitted"
        );
        Ok((product, review))
    }
}
