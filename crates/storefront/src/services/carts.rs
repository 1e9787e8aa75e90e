//! Cart storage and cart operations.
//!
//! Carts live outside the session so they survive logout and can be stored
//! either in-process (moka, idle expiry) or in the `cart` table.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use moka::future::Cache;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use bazaar_core::{Cart, CartError, CartView, ProductId, UserId};

use crate::db::{CartRepository, ProductRepository, RepositoryError};
use crate::models::Product;

/// Upper bound on carts held by the in-memory store.
const MEMORY_CART_CAPACITY: u64 = 10_000;

#[derive(Debug, Error)]
pub enum CartStoreError {
    #[error("cart storage failed: {0}")]
    Repository(#[from] RepositoryError),
}

/// Per-user cart persistence.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// The user's cart, or an empty one if none is stored.
    async fn load(&self, user_id: UserId) -> Result<Cart, CartStoreError>;

    /// Store the cart. Saving an empty cart removes it.
    async fn save(&self, user_id: UserId, cart: &Cart) -> Result<(), CartStoreError>;

    async fn clear(&self, user_id: UserId) -> Result<(), CartStoreError>;
}

/// Carts held in process memory, dropped after `ttl` without access.
#[derive(Clone)]
pub struct MemoryCartStore {
    carts: Cache<UserId, Cart>,
}

impl MemoryCartStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let carts = Cache::builder()
            .max_capacity(MEMORY_CART_CAPACITY)
            .time_to_idle(ttl)
            .build();
        Self { carts }
    }
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn load(&self, user_id: UserId) -> Result<Cart, CartStoreError> {
        Ok(self.carts.get(&user_id).await.unwrap_or_default())
    }

    async fn save(&self, user_id: UserId, cart: &Cart) -> Result<(), CartStoreError> {
        if cart.is_empty() {
            self.carts.invalidate(&user_id).await;
        } else {
            self.carts.insert(user_id, cart.clone()).await;
        }
        Ok(())
    }

    async fn clear(&self, user_id: UserId) -> Result<(), CartStoreError> {
        self.carts.invalidate(&user_id).await;
        Ok(())
    }
}

/// Carts stored in `PostgreSQL`; every save pushes the expiry out by `ttl`.
#[derive(Clone)]
pub struct PgCartStore {
    pool: PgPool,
    ttl: chrono::Duration,
}

impl PgCartStore {
    #[must_use]
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        Self { pool, ttl }
    }
}

#[async_trait]
impl CartStore for PgCartStore {
    async fn load(&self, user_id: UserId) -> Result<Cart, CartStoreError> {
        let cart = CartRepository::new(&self.pool)
            .load(user_id, Utc::now())
            .await?;
        Ok(cart.unwrap_or_default())
    }

    async fn save(&self, user_id: UserId, cart: &Cart) -> Result<(), CartStoreError> {
        let repo = CartRepository::new(&self.pool);
        if cart.is_empty() {
            repo.delete(user_id).await?;
        } else {
            let expires_at = Utc::now()
                .checked_add_signed(self.ttl)
                .unwrap_or(chrono::DateTime::<Utc>::MAX_UTC);
            repo.save(user_id, cart, expires_at).await?;
        }
        Ok(())
    }

    async fn clear(&self, user_id: UserId) -> Result<(), CartStoreError> {
        CartRepository::new(&self.pool).delete(user_id).await?;
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum CartServiceError {
    #[error("Product not found")]
    ProductNotFound,

    /// The add was refused; the message is shown to the buyer.
    #[error(transparent)]
    Rejected(#[from] CartError),

    #[error(transparent)]
    Store(#[from] CartStoreError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A successful add.
#[derive(Debug, Clone)]
pub struct AddedToCart {
    pub product: Product,
    /// The line's quantity after the add.
    pub quantity: u32,
}

pub struct CartService<'a> {
    products: ProductRepository<'a>,
    store: &'a dyn CartStore,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, store: &'a dyn CartStore) -> Self {
        Self {
            products: ProductRepository::new(pool),
            store,
        }
    }

    /// Add `quantity` units of a product to the buyer's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::ProductNotFound` for an unknown product and
    /// `CartServiceError::Rejected` when the quantity or stock check fails;
    /// the cart is unchanged in both cases.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn add(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<AddedToCart, CartServiceError> {
        let product = self
            .products
            .get(product_id)
            .await?
            .ok_or(CartServiceError::ProductNotFound)?;

        let mut cart = self.store.load(user_id).await?;
        let quantity = cart.add(&product.snapshot(), quantity)?;
        self.store.save(user_id, &cart).await?;

        tracing::debug!(quantity, "cart line updated");
        Ok(AddedToCart { product, quantity })
    }

    /// Drop a product's line. Removing an absent line is not an error.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::Store` if the cart cannot be loaded or saved.
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, CartServiceError> {
        let mut cart = self.store.load(user_id).await?;
        let removed = cart.remove(product_id);
        if removed {
            self.store.save(user_id, &cart).await?;
        }
        Ok(removed)
    }

    /// # Errors
    ///
    /// Returns `CartServiceError::Store` if the cart cannot be loaded.
    pub async fn view(&self, user_id: UserId) -> Result<CartView, CartServiceError> {
        Ok(self.store.load(user_id).await?.view())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use bazaar_core::ProductSnapshot;

    use super::*;

    fn snapshot(id: i32, stock: i32) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Decimal::new(1000, 2),
            stock,
        }
    }

    #[tokio::test]
    async fn test_memory_store_starts_empty() {
        let store = MemoryCartStore::new(Duration::from_secs(60));
        let cart = store.load(UserId::new(1)).await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_keeps_carts_per_user() {
        let store = MemoryCartStore::new(Duration::from_secs(60));
        let mut cart = Cart::new();
        cart.add(&snapshot(1, 5), 2).unwrap();

        store.save(UserId::new(1), &cart).await.unwrap();

        assert_eq!(
            store
                .load(UserId::new(1))
                .await
                .unwrap()
                .quantity_of(ProductId::new(1)),
            Some(2)
        );
        assert!(store.load(UserId::new(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_saving_empty_cart_removes_it() {
        let store = MemoryCartStore::new(Duration::from_secs(60));
        let mut cart = Cart::new();
        cart.add(&snapshot(1, 5), 1).unwrap();
        store.save(UserId::new(1), &cart).await.unwrap();

        cart.remove(ProductId::new(1));
        store.save(UserId::new(1), &cart).await.unwrap();

        assert!(store.load(UserId::new(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_clear() {
        let store = MemoryCartStore::new(Duration::from_secs(60));
        let mut cart = Cart::new();
        cart.add(&snapshot(3, 5), 1).unwrap();
        store.save(UserId::new(9), &cart).await.unwrap();

        store.clear(UserId::new(9)).await.unwrap();

        assert!(store.load(UserId::new(9)).await.unwrap().is_empty());
    }

    #[test]
    fn test_rejections_carry_buyer_message() {
        let err = CartServiceError::from(CartError::InsufficientStock { available: 2 });
        assert_eq!(err.to_string(), "Only 2 units available.");
    }
}
