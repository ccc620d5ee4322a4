//! Cart Records

use jiff::Timestamp;
use platter::{CartStatus, money::line_total, status::is_attachable};
use rust_decimal::Decimal;

use crate::{
    domain::{
        catalog::records::{DishUuid, RestaurantUuid},
        orders::records::OrderUuid,
        users::records::UserUuid,
    },
    uuids::TypedUuid,
};

/// Cart UUID
pub type CartUuid = TypedUuid<CartRecord>;

/// Cart Record
#[derive(Debug, Clone, PartialEq)]
pub struct CartRecord {
    pub uuid: CartUuid,
    pub user: UserUuid,
    pub restaurant: RestaurantUuid,
    pub delivery_order: Option<OrderUuid>,
    pub status: CartStatus,
    pub note: Option<String>,

    /// The one cart a user is currently filling.
    pub is_current: bool,

    pub total_price: Decimal,
    pub items: Vec<CartItemRecord>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CartRecord {
    pub fn item(&self, dish: DishUuid) -> Option<&CartItemRecord> {
        self.items.iter().find(|item| item.dish == dish)
    }

    /// Whether this cart may join a delivery order.
    pub fn is_attachable(&self) -> bool {
        is_attachable(self.status, self.items.len())
    }
}

/// Cart Item Record
///
/// Name and price are copied from the menu when the line is written, so the line survives
/// later catalog edits.
#[derive(Debug, Clone, PartialEq)]
pub struct CartItemRecord {
    pub cart: CartUuid,
    pub dish: DishUuid,
    pub dish_name: String,
    pub amount: u32,
    pub price_at_time: Decimal,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CartItemRecord {
    pub fn line_total(&self) -> Decimal {
        line_total(self.amount, self.price_at_time)
    }
}
