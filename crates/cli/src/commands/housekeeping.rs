//! Purging of expired rows.
//!
//! Expired reset tokens and carts are already ignored at read time; these
//! commands just reclaim the space. Safe to run from cron.

use chrono::Utc;

use bazaar_storefront::db::{CartRepository, ResetTokenRepository};

use super::{CommandError, connect};

/// Delete password reset tokens past their expiry.
pub async fn purge_tokens() -> Result<u64, CommandError> {
    let pool = connect().await?;
    let deleted = ResetTokenRepository::new(&pool)
        .delete_expired(Utc::now())
        .await?;
    tracing::info!(deleted, "Expired reset tokens purged");
    Ok(deleted)
}

/// Delete persisted carts past their expiry.
pub async fn purge_carts() -> Result<u64, CommandError> {
    let pool = connect().await?;
    let deleted = CartRepository::new(&pool).delete_expired(Utc::now()).await?;
    tracing::info!(deleted, "Expired carts purged");
    Ok(deleted)
}
