//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! bazaar migrate
//! ```
//!
//! Applies the migrations embedded from `crates/storefront/migrations/`.
//! The session table is created by the storefront's session store on startup.

use bazaar_storefront::db;

use super::{CommandError, connect};

/// Run storefront database migrations.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running storefront migrations...");
    db::run_migrations(&pool).await?;

    tracing::info!("Storefront migrations complete!");
    Ok(())
}
