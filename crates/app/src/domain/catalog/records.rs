//! Catalog Records

use jiff::Timestamp;
use rust_decimal::Decimal;

use crate::uuids::TypedUuid;

/// Restaurant UUID
pub type RestaurantUuid = TypedUuid<RestaurantRecord>;

/// Category UUID
pub type CategoryUuid = TypedUuid<CategoryRecord>;

/// Dish UUID
pub type DishUuid = TypedUuid<DishRecord>;

/// Restaurant Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestaurantRecord {
    pub uuid: RestaurantUuid,
    pub name: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Category Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRecord {
    pub uuid: CategoryUuid,
    pub restaurant: RestaurantUuid,
    pub name: String,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Dish Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DishRecord {
    pub uuid: DishUuid,
    pub category: CategoryUuid,
    pub name: String,

    /// Current menu price. Cart lines keep their own snapshot.
    pub price: Decimal,

    pub display_order: i32,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
