//! Decimal money helpers.
//!
//! Amounts are plain [`Decimal`] values in the marketplace currency (South
//! African rand). Prices are stored with two decimal places, so these helpers
//! only fix the scale used for display and totals.

use rust_decimal::{Decimal, RoundingStrategy};

/// Symbol prefixed to every displayed amount.
pub const CURRENCY_SYMBOL: &str = "R";

/// Round an amount to cents.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Format an amount for display, e.g. `R27.50`.
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    format!("{CURRENCY_SYMBOL}{}", round_money(amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_money_pads_and_rounds() {
        assert_eq!(round_money(Decimal::new(75, 1)).to_string(), "7.50");
        assert_eq!(round_money(Decimal::new(10_005, 3)).to_string(), "10.01");
        assert_eq!(round_money(Decimal::from(20)).to_string(), "20.00");
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(Decimal::new(2750, 2)), "R27.50");
        assert_eq!(format_money(Decimal::ZERO), "R0.00");
    }
}
