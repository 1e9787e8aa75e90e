//! Checkout: cart to order.

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use bazaar_core::SkippedLine;

use super::carts::{CartStore, CartStoreError};
use super::email::{EmailService, NotificationOutcome};
use crate::db::{OrderRepository, RepositoryError};
use crate::models::{CurrentUser, Order, OrderItem};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,

    #[error(transparent)]
    CartStore(#[from] CartStoreError),

    #[error("checkout failed: {0}")]
    Repository(#[from] RepositoryError),
}

/// Everything the buyer should hear about a completed checkout.
#[derive(Debug, Clone)]
pub struct CheckoutReceipt {
    pub order: Order,
    pub items: Vec<OrderItem>,
    /// Lines dropped for missing products or short stock.
    pub skipped: Vec<SkippedLine>,
    pub notification: NotificationOutcome,
}

impl CheckoutReceipt {
    /// One warning per skipped line.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.skipped.iter().map(SkippedLine::message).collect()
    }

    /// Whether every cart line was skipped, leaving an order with no items.
    #[must_use]
    pub fn is_empty_order(&self) -> bool {
        self.items.is_empty()
    }
}

pub struct CheckoutService<'a> {
    orders: OrderRepository<'a>,
    carts: &'a dyn CartStore,
    email: Option<&'a EmailService>,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        carts: &'a dyn CartStore,
        email: Option<&'a EmailService>,
    ) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            carts,
            email,
        }
    }

    /// Place an order for everything in the buyer's cart that can be filled.
    ///
    /// The cart is cleared once the order commits. The invoice email is
    /// best-effort and never fails the checkout.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` without touching the database when
    /// the cart has no lines, or `CheckoutError::Repository` if the order
    /// transaction fails (in which case nothing is written).
    #[instrument(skip(self, buyer), fields(user_id = %buyer.id))]
    pub async fn checkout(&self, buyer: &CurrentUser) -> Result<CheckoutReceipt, CheckoutError> {
        let cart = self.carts.load(buyer.id).await?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let record = self.orders.place(buyer.id, &cart).await?;
        tracing::info!(
            order_id = %record.order.id,
            items = record.items.len(),
            skipped = record.skipped.len(),
            total = %record.order.total_price,
            "order placed"
        );

        if let Err(e) = self.carts.clear(buyer.id).await {
            tracing::error!(error = %e, "failed to clear cart after checkout");
        }

        let notification = match self.email {
            Some(service) => NotificationOutcome::from_result(
                service
                    .send_invoice(buyer.email.as_str(), &record.order, &record.items)
                    .await,
                "invoice",
            ),
            None => NotificationOutcome::Disabled,
        };

        Ok(CheckoutReceipt {
            order: record.order,
            items: record.items,
            skipped: record.skipped,
            notification,
        })
    }
}
