//! Cart totals and money display.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::CartItem;

/// Orders with a subtotal strictly above this ship free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(500, 0, 0, false, 0);
pub const FLAT_SHIPPING_FEE: Decimal = Decimal::from_parts(99, 0, 0, false, 0);
/// 18%
pub const TAX_RATE: Decimal = Decimal::from_parts(18, 0, 0, false, 2);
/// Highest unit price a product may carry.
pub const MAX_PRICE: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

const CURRENCY_PREFIX: &str = "Rs";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct CartTotals {
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub shipping: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total: Decimal,
}

impl CartTotals {
    /// `None` if any step overflows.
    pub fn from_items(items: &[CartItem]) -> Option<Self> {
        let subtotal = items.iter().try_fold(Decimal::ZERO, |acc, item| {
            acc.checked_add(item.line_total()?)
        })?;
        Self::from_subtotal(subtotal)
    }

    /// Values stay unrounded; rounding is a display concern.
    pub fn from_subtotal(subtotal: Decimal) -> Option<Self> {
        let shipping = shipping_for(subtotal);
        let tax = subtotal.checked_mul(TAX_RATE)?;
        let total = subtotal.checked_add(shipping)?.checked_add(tax)?;
        Some(Self {
            subtotal,
            shipping,
            tax,
            total,
        })
    }
}

pub fn shipping_for(subtotal: Decimal) -> Decimal {
    if subtotal > FREE_SHIPPING_THRESHOLD {
        Decimal::ZERO
    } else {
        FLAT_SHIPPING_FEE
    }
}

/// `Rs 2360.00`
pub fn format_amount(amount: Decimal) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    format!("{CURRENCY_PREFIX} {rounded}")
}

pub fn format_shipping(shipping: Decimal) -> String {
    if shipping.is_zero() {
        "Free".to_string()
    } else {
        format_amount(shipping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_exclusive() {
        assert_eq!(shipping_for(Decimal::new(500, 0)), FLAT_SHIPPING_FEE);
        assert_eq!(shipping_for(Decimal::new(50001, 2)), Decimal::ZERO);
    }

    #[test]
    fn overflowing_lines_yield_no_totals() {
        assert!(CartTotals::from_subtotal(Decimal::MAX).is_none());
        assert!(CartTotals::from_subtotal(MAX_PRICE).is_some());
    }

    #[test]
    fn amounts_render_with_two_decimals() {
        assert_eq!(format_amount(Decimal::new(2360, 0)), "Rs 2360.00");
        assert_eq!(format_amount(Decimal::new(449999820, 5)), "Rs 4500.00");
        assert_eq!(format_amount(Decimal::new(12345, 3)), "Rs 12.35");
        assert_eq!(format_shipping(Decimal::ZERO), "Free");
        assert_eq!(format_shipping(FLAT_SHIPPING_FEE), "Rs 99.00");
    }
}
