//! Delivery Order Data

use platter::PaymentMethod;

use crate::domain::{catalog::records::RestaurantUuid, orders::records::OrderUuid};

/// New Delivery Order Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub uuid: OrderUuid,
    pub restaurant: RestaurantUuid,

    /// Free-form input; normalised before storing.
    pub phone_number: Option<String>,

    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

impl NewOrder {
    /// An order with no contact details.
    pub fn for_restaurant(restaurant: RestaurantUuid) -> Self {
        Self {
            uuid: OrderUuid::new(),
            restaurant,
            phone_number: None,
            payment_method: None,
            notes: None,
        }
    }
}
