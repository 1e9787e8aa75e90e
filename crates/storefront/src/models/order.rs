//! Orders created at checkout.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

use bazaar_core::{OrderId, OrderItemId, ProductId, UserId, round_money};

#[derive(Debug, Clone, FromRow)]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: UserId,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// One purchased line. The price is fixed at purchase time.
#[derive(Debug, Clone, FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i32,
    pub price_at_purchase: Decimal,
}

impl OrderItem {
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        round_money(self.price_at_purchase * Decimal::from(self.quantity))
    }
}
