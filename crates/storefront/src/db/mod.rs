//! Database operations for the storefront `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `app_user` - Accounts with their role and argon2 password hash
//! - `reset_token` - Password reset token digests
//! - `store`, `product` - The vendor catalog
//! - `customer_order`, `order_item` - Checkout results
//! - `review` - Product reviews
//! - `cart` - Persisted buyer carts (when the Postgres cart backend is used)
//! - `tower_sessions.session` - Session storage, created by the session store
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p bazaar-cli -- migrate
//! ```

pub mod carts;
pub mod orders;
pub mod products;
pub mod reset_tokens;
pub mod reviews;
pub mod stores;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub use carts::CartRepository;
pub use orders::{CheckoutRecord, OrderRepository};
pub use products::{ProductInput, ProductRepository};
pub use reset_tokens::ResetTokenRepository;
pub use reviews::ReviewRepository;
pub use stores::{StoreInput, StoreRepository};
pub use users::UserRepository;

/// Errors returned by the repositories.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value failed validation on the way out.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique-constraint violation to [`RepositoryError::Conflict`].
pub(crate) fn conflict_on_unique(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(err)
}

/// Create a `PostgreSQL` connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Run the embedded storefront migrations.
///
/// # Errors
///
/// Returns `sqlx::migrate::MigrateError` if a migration fails to apply.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
