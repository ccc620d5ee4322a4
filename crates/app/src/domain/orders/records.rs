//! Delivery Order Records

use jiff::Timestamp;
use platter::{OrderStatus, PaymentMethod};
use rust_decimal::Decimal;

use crate::{
    domain::{
        carts::records::CartRecord,
        catalog::records::RestaurantUuid,
        users::records::{UserRecord, UserUuid},
    },
    uuids::TypedUuid,
};

/// Delivery Order UUID
pub type OrderUuid = TypedUuid<OrderRecord>;

/// Delivery Order Record
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub uuid: OrderUuid,
    pub restaurant: RestaurantUuid,
    pub creator: UserUuid,
    pub delivery_person: UserUuid,
    pub status: OrderStatus,

    /// Where members send their money; normalised like user phone numbers.
    pub phone_number: Option<String>,

    pub payment_method: Option<PaymentMethod>,

    /// Sum of the totals of the carts that count towards this order.
    pub total_amount: Decimal,

    pub notes: Option<String>,
    pub collected_at: Option<Timestamp>,
    pub delivered_at: Option<Timestamp>,
    pub cancelled_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl OrderRecord {
    /// Whether `user` created or delivers this order.
    pub fn is_managed_by(&self, user: UserUuid) -> bool {
        self.creator == user || self.delivery_person == user
    }
}

/// One member's contribution to an order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCart {
    pub owner: UserRecord,
    pub cart: CartRecord,
}
