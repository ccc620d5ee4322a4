//! Cart Data

use rust_decimal::Decimal;

use crate::domain::catalog::records::DishUuid;

/// A cart line written with an explicit price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartItem {
    pub dish: DishUuid,
    pub amount: u32,
    pub price_at_time: Decimal,
}

/// A dish picked from the menu screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuSelection {
    pub dish: DishUuid,
    pub count: u32,
}

/// A fully resolved line, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CartLine {
    pub(crate) dish: DishUuid,
    pub(crate) dish_name: String,
    pub(crate) amount: u32,
    pub(crate) price_at_time: Decimal,
}

/// How an upsert treats a line that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AmountPolicy {
    /// Overwrite the amount.
    Absolute,

    /// Add to the amount.
    Increment,
}

impl AmountPolicy {
    pub(crate) fn increments(self) -> bool {
        matches!(self, AmountPolicy::Increment)
    }
}
