//! The buyer's cart.
//!
//! A cart is an ordered list of lines, one per product, each carrying the name
//! and unit price captured when the product was first added. The snapshot is
//! for display only: checkout always charges the product's current price.
//!
//! Carts are serialized whole into the cart store, so every field here is part
//! of the stored format. Prices serialize as decimal strings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ProductId, round_money};

/// Why an item could not be added to the cart.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("Quantity must be at least 1")]
    InvalidQuantity,
    #[error("This product is out of stock")]
    OutOfStock,
    #[error("Only {available} units available.")]
    InsufficientStock { available: i32 },
}

/// The product facts the cart needs when adding an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSnapshot {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
}

impl CartLine {
    /// Unit price times quantity, rounded to cents.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        round_money(self.unit_price * Decimal::from(self.quantity))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add `quantity` units of `product`, returning the line's new quantity.
    ///
    /// Stock is checked against the requested quantity alone; units already in
    /// the cart are not counted. An existing line keeps its original name and
    /// price snapshot and only has its quantity increased.
    ///
    /// # Errors
    ///
    /// Fails without touching the cart when the quantity is zero, the product
    /// has no stock, or the request exceeds the available stock. A merge that
    /// would overflow the line's quantity is `InvalidQuantity`.
    pub fn add(&mut self, product: &ProductSnapshot, quantity: u32) -> Result<u32, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        if product.stock <= 0 {
            return Err(CartError::OutOfStock);
        }
        if i64::from(quantity) > i64::from(product.stock) {
            return Err(CartError::InsufficientStock {
                available: product.stock,
            });
        }

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product.id)
        {
            line.quantity = line
                .quantity
                .checked_add(quantity)
                .ok_or(CartError::InvalidQuantity)?;
            return Ok(line.quantity);
        }

        self.lines.push(CartLine {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.price,
            quantity,
        });
        Ok(quantity)
    }

    /// Remove the line for `product_id`, returning whether one existed.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id != product_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0, |acc, line| acc.saturating_add(line.quantity))
    }

    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> Option<u32> {
        self.lines
            .iter()
            .find(|line| line.product_id == product_id)
            .map(|line| line.quantity)
    }

    /// Lines with subtotals and the grand total, in the order they were added.
    ///
    /// The total is the sum of the displayed (rounded) subtotals.
    #[must_use]
    pub fn view(&self) -> CartView {
        let lines: Vec<CartLineView> = self
            .lines
            .iter()
            .map(|line| CartLineView {
                product_id: line.product_id,
                name: line.name.clone(),
                unit_price: line.unit_price,
                quantity: line.quantity,
                subtotal: line.subtotal(),
            })
            .collect();
        let total = round_money(lines.iter().map(|line| line.subtotal).sum());

        CartView {
            lines,
            total,
            item_count: self.item_count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total: Decimal,
    pub item_count: u32,
}

impl CartView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn product(id: i32, name: &str, cents: i64, stock: i32) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new(id),
            name: name.to_owned(),
            price: Decimal::new(cents, 2),
            stock,
        }
    }

    #[test]
    fn test_add_creates_line_with_snapshot() {
        let mut cart = Cart::new();
        assert_eq!(cart.add(&product(1, "Rooibos", 1000, 5), 2).unwrap(), 2);

        let line = &cart.lines()[0];
        assert_eq!(line.name, "Rooibos");
        assert_eq!(line.unit_price, Decimal::new(1000, 2));
        assert_eq!(line.quantity, 2);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_add_existing_line_sums_quantity_and_keeps_snapshot() {
        let mut cart = Cart::new();
        cart.add(&product(1, "Rooibos", 1000, 5), 2).unwrap();

        let repriced = product(1, "Rooibos Deluxe", 1200, 5);
        assert_eq!(cart.add(&repriced, 3).unwrap(), 5);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.quantity_of(ProductId::new(1)), Some(5));
        assert_eq!(cart.lines()[0].name, "Rooibos");
        assert_eq!(cart.lines()[0].unit_price, Decimal::new(1000, 2));
    }

    #[test]
    fn test_stock_check_ignores_quantity_already_in_cart() {
        let mut cart = Cart::new();
        let p = product(1, "Biltong", 500, 3);
        cart.add(&p, 3).unwrap();
        cart.add(&p, 3).unwrap();

        assert_eq!(cart.quantity_of(p.id), Some(6));
    }

    #[test]
    fn test_add_rejects_out_of_stock() {
        let mut cart = Cart::new();
        let err = cart.add(&product(1, "Rusks", 300, 0), 1).unwrap_err();

        assert_eq!(err, CartError::OutOfStock);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_rejects_more_than_available_and_leaves_cart_unchanged() {
        let mut cart = Cart::new();
        cart.add(&product(2, "Chutney", 750, 3), 1).unwrap();
        let before = cart.clone();

        let err = cart.add(&product(2, "Chutney", 750, 3), 4).unwrap_err();

        assert_eq!(err, CartError::InsufficientStock { available: 3 });
        assert_eq!(err.to_string(), "Only 3 units available.");
        assert_eq!(cart, before);
    }

    #[test]
    fn test_add_rejects_zero_quantity() {
        let mut cart = Cart::new();
        assert_eq!(
            cart.add(&product(1, "Rusks", 300, 9), 0).unwrap_err(),
            CartError::InvalidQuantity
        );
    }

    #[test]
    fn test_add_rejects_line_quantity_overflow() {
        let mut cart = Cart::new();
        let p = product(1, "Rusks", 300, i32::MAX);
        for _ in 0..2 {
            cart.add(&p, u32::try_from(i32::MAX).unwrap()).unwrap();
        }
        let before = cart.clone();

        let err = cart.add(&p, 2).unwrap_err();

        assert_eq!(err, CartError::InvalidQuantity);
        assert_eq!(cart, before);
        assert_eq!(cart.quantity_of(p.id), Some(u32::MAX - 1));
    }

    #[test]
    fn test_remove() {
        let mut cart = Cart::new();
        cart.add(&product(1, "A", 100, 5), 1).unwrap();
        cart.add(&product(2, "B", 100, 5), 1).unwrap();

        assert!(cart.remove(ProductId::new(1)));
        assert!(!cart.remove(ProductId::new(1)));
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].product_id, ProductId::new(2));
    }

    #[test]
    fn test_view_preserves_insertion_order_and_totals() {
        let mut cart = Cart::new();
        cart.add(&product(1, "A", 1000, 5), 2).unwrap();
        cart.add(&product(2, "B", 750, 3), 1).unwrap();

        let view = cart.view();

        assert_eq!(view.lines[0].name, "A");
        assert_eq!(view.lines[0].subtotal.to_string(), "20.00");
        assert_eq!(view.lines[1].subtotal.to_string(), "7.50");
        assert_eq!(view.total.to_string(), "27.50");
        assert_eq!(view.item_count, 3);
    }

    #[test]
    fn test_view_total_is_sum_of_displayed_subtotals() {
        let mut cart = Cart::new();
        cart.add(&product(1, "A", 333, 10), 3).unwrap();
        cart.add(&product(2, "B", 1, 10), 7).unwrap();

        let view = cart.view();
        let sum: Decimal = view.lines.iter().map(|l| l.subtotal).sum();

        assert_eq!(view.total, sum);
    }

    #[test]
    fn test_empty_view() {
        let view = Cart::new().view();
        assert!(view.is_empty());
        assert_eq!(view.total.to_string(), "0.00");
    }

    #[test]
    fn test_serialized_prices_are_strings() {
        let mut cart = Cart::new();
        cart.add(&product(9, "Koeksister", 1250, 4), 1).unwrap();

        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json["lines"][0]["unit_price"], "12.50");

        let back: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(back, cart);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add(&product(1, "A", 100, 5), 1).unwrap();
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
    }
}
