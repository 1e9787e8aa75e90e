//! Checkout settlement.
//!
//! [`settle`] decides, line by line, what a cart turns into once current
//! stock and prices are known. The storefront loads (and locks) the products,
//! calls `settle`, then persists the result; keeping the decision pure means
//! the partial-fulfilment rules are tested here without a database.
//!
//! Rules per cart line, in cart order:
//! - product no longer exists: skipped
//! - product stock is zero: skipped
//! - product stock below the requested quantity: skipped
//! - otherwise: an item at the product's *current* price, and stock is reduced
//!
//! The order total is the sum of the settled item subtotals.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::cart::Cart;
use crate::types::{ProductId, round_money};

/// Current state of a product at checkout time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLevel {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Missing,
    OutOfStock,
    InsufficientStock { available: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    pub product_id: ProductId,
    pub name: String,
    pub requested: u32,
    pub reason: SkipReason,
}

impl SkippedLine {
    /// Message shown to the buyer for this line.
    #[must_use]
    pub fn message(&self) -> String {
        match self.reason {
            SkipReason::Missing => format!("{} is no longer available and was removed", self.name),
            SkipReason::OutOfStock => format!("{} is out of stock and was removed", self.name),
            SkipReason::InsufficientStock { available } => format!(
                "{} only has {available} units left and was removed",
                self.name
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledItem {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    /// Stock left on the product after this item is taken.
    pub remaining_stock: i32,
}

impl SettledItem {
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        round_money(self.unit_price * Decimal::from(self.quantity))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub items: Vec<SettledItem>,
    pub skipped: Vec<SkippedLine>,
    pub total: Decimal,
}

impl Settlement {
    #[must_use]
    pub fn is_fully_skipped(&self) -> bool {
        self.items.is_empty()
    }
}

/// Settle `cart` against the current `products`.
///
/// Products absent from the map are treated as deleted. If the same product
/// somehow appears on several lines, stock taken by earlier lines is not
/// available to later ones.
#[must_use]
pub fn settle(cart: &Cart, products: &HashMap<ProductId, StockLevel>) -> Settlement {
    let mut remaining: HashMap<ProductId, i32> = HashMap::new();
    let mut items = Vec::new();
    let mut skipped = Vec::new();

    for line in cart.lines() {
        let Some(product) = products.get(&line.product_id) else {
            skipped.push(SkippedLine {
                product_id: line.product_id,
                name: line.name.clone(),
                requested: line.quantity,
                reason: SkipReason::Missing,
            });
            continue;
        };

        let available = *remaining.entry(product.product_id).or_insert(product.stock);
        let reason = if available <= 0 {
            Some(SkipReason::OutOfStock)
        } else if i64::from(available) < i64::from(line.quantity) {
            Some(SkipReason::InsufficientStock { available })
        } else {
            None
        };

        if let Some(reason) = reason {
            skipped.push(SkippedLine {
                product_id: product.product_id,
                name: product.name.clone(),
                requested: line.quantity,
                reason,
            });
            continue;
        }

        // available >= quantity > 0, so the quantity fits in an i32.
        let taken = i32::try_from(line.quantity).unwrap_or(available);
        let left = available - taken;
        remaining.insert(product.product_id, left);
        items.push(SettledItem {
            product_id: product.product_id,
            name: product.name.clone(),
            quantity: line.quantity,
            unit_price: product.price,
            remaining_stock: left,
        });
    }

    let total = round_money(items.iter().map(SettledItem::subtotal).sum());
    Settlement {
        items,
        skipped,
        total,
    }
}
