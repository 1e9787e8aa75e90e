//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::{CartBackend, StorefrontConfig};
use crate::services::{CartStore, EmailService, MemoryCartStore, PgCartStore};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    carts: Arc<dyn CartStore>,
    email: Option<EmailService>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The cart backend follows `config.cart_backend`. Outgoing email is
    /// disabled when SMTP is not configured or the relay cannot be set up.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let carts: Arc<dyn CartStore> = match config.cart_backend {
            CartBackend::Memory => Arc::new(MemoryCartStore::new(config.cart_ttl)),
            CartBackend::Postgres => Arc::new(PgCartStore::new(pool.clone(), config.cart_ttl)),
        };

        let email = config
            .email
            .as_ref()
            .and_then(|email_config| match EmailService::new(email_config) {
                Ok(service) => Some(service),
                Err(e) => {
                    tracing::error!(error = %e, "SMTP relay misconfigured; email disabled");
                    None
                }
            });
        if email.is_none() {
            tracing::warn!("Outgoing email disabled");
        }

        Self::with_parts(config, pool, carts, email)
    }

    /// Assemble state from explicit parts.
    #[must_use]
    pub fn with_parts(
        config: StorefrontConfig,
        pool: PgPool,
        carts: Arc<dyn CartStore>,
        email: Option<EmailService>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                carts,
                email,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn carts(&self) -> &dyn CartStore {
        self.inner.carts.as_ref()
    }

    /// The email service, if outgoing email is configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }
}
