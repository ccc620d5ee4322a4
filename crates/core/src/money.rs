//! Money
//!
//! Prices are exact decimals with two fractional digits. Arithmetic never rounds; values are
//! only rounded when rendered.

use rust_decimal::{Decimal, RoundingStrategy};

/// Fractional digits prices are stored and rendered with.
pub const PRICE_SCALE: u32 = 2;

/// Total price of a line item.
pub fn line_total(amount: u32, unit_price: Decimal) -> Decimal {
    Decimal::from(amount) * unit_price
}

/// Exact sum of `(amount, unit_price)` lines.
pub fn sum_lines<I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = (u32, Decimal)>,
{
    lines
        .into_iter()
        .map(|(amount, unit_price)| line_total(amount, unit_price))
        .sum()
}

/// Rounds half away from zero to [`PRICE_SCALE`] digits.
pub fn round_for_display(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Renders a monetary value with exactly two decimal places.
pub fn format_amount(value: Decimal) -> String {
    format!("{:.2}", round_for_display(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_total_multiplies_without_rounding() {
        assert_eq!(line_total(3, Decimal::new(1200, 2)), Decimal::new(3600, 2));
        assert_eq!(line_total(7, Decimal::new(15, 2)), Decimal::new(105, 2));
    }

    #[test]
    fn sum_lines_is_exact() {
        let total = sum_lines([(2, Decimal::new(1000, 2)), (3, Decimal::new(1200, 2))]);

        assert_eq!(total, Decimal::new(5600, 2));
    }

    #[test]
    fn sum_of_no_lines_is_zero() {
        assert_eq!(sum_lines(std::iter::empty()), Decimal::ZERO);
    }

    #[test]
    fn format_amount_pads_and_rounds_half_away_from_zero() {
        assert_eq!(format_amount(Decimal::from(5)), "5.00");
        assert_eq!(format_amount(Decimal::new(2005, 3)), "2.01");
        assert_eq!(format_amount(Decimal::new(2505, 1)), "250.50");
    }
}
