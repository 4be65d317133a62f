//! Money helpers over [`Decimal`].
//!
//! Prices and order totals are stored as `NUMERIC(10, 2)` dollars. The payment
//! provider takes integer minor units (cents).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Errors converting an amount to minor units.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// Negative amounts cannot be charged.
    #[error("amount cannot be negative: {0}")]
    Negative(Decimal),
    /// The amount does not fit in an `i64` number of cents.
    #[error("amount out of range: {0}")]
    OutOfRange(Decimal),
}

/// Convert a dollar amount to whole cents, rounding fractional cents down.
///
/// ```
/// use food_order_core::to_minor_units;
/// use rust_decimal::Decimal;
///
/// assert_eq!(to_minor_units(Decimal::new(1299, 2)).unwrap(), 1299);
/// assert_eq!(to_minor_units(Decimal::new(12_999, 3)).unwrap(), 1299);
/// ```
///
/// # Errors
///
/// Returns [`MoneyError::Negative`] for negative input and
/// [`MoneyError::OutOfRange`] if the result overflows `i64`.
pub fn to_minor_units(amount: Decimal) -> Result<i64, MoneyError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(MoneyError::Negative(amount));
    }
    let cents = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or(MoneyError::OutOfRange(amount))?
        .floor();
    cents.to_i64().ok_or(MoneyError::OutOfRange(amount))
}

/// Format a dollar amount for display, e.g. `$12.50`.
#[must_use]
pub fn format_usd(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("${rounded:.2}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_units_floor() {
        assert_eq!(to_minor_units(Decimal::new(1150, 2)).unwrap(), 1150);
        assert_eq!(to_minor_units(Decimal::new(10_009, 3)).unwrap(), 1000);
        assert_eq!(to_minor_units(Decimal::ZERO).unwrap(), 0);
    }

    #[test]
    fn test_minor_units_negative() {
        assert!(matches!(
            to_minor_units(Decimal::new(-1, 2)),
            Err(MoneyError::Negative(_))
        ));
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(Decimal::new(125, 1)), "$12.50");
        assert_eq!(format_usd(Decimal::new(7, 0)), "$7.00");
        assert_eq!(format_usd(Decimal::new(19_995, 3)), "$20.00");
    }
}
