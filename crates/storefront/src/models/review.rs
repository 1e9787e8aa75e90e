//! Product reviews.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use bazaar_core::{ProductId, Rating, ReviewId, UserId};

/// A buyer's review. `is_verified` is decided once, when the review is written.
#[derive(Debug, Clone, FromRow)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub reviewer_id: UserId,
    pub reviewer_username: String,
    pub rating: Rating,
    pub comment: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}
