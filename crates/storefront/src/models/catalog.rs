//! Stores and products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

use bazaar_core::{ProductId, ProductSnapshot, StockLevel, StoreId, UserId, format_money};

/// A vendor's store.
#[derive(Debug, Clone, FromRow)]
pub struct Store {
    pub id: StoreId,
    pub owner_id: UserId,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// A product listed in a store.
#[derive(Debug, Clone, FromRow)]
pub struct Product {
    pub id: ProductId,
    pub store_id: StoreId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub const fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    #[must_use]
    pub fn display_price(&self) -> String {
        format_money(self.price)
    }

    /// The facts the cart captures when this product is added.
    #[must_use]
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            id: self.id,
            name: self.name.clone(),
            price: self.price,
            stock: self.stock,
        }
    }

    #[must_use]
    pub fn stock_level(&self) -> StockLevel {
        StockLevel {
            product_id: self.id,
            name: self.name.clone(),
            price: self.price,
            stock: self.stock,
        }
    }
}
