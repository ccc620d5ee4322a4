//! Menu lookups for cart lines.

use rust_decimal::Decimal;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use crate::domain::catalog::records::{DishUuid, RestaurantUuid};

const GET_MENU_DISH_SQL: &str = include_str!("../sql/get_menu_dish.sql");

/// A dish as seen from a cart: its live price and the restaurant it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MenuDish {
    pub(crate) uuid: DishUuid,
    pub(crate) name: String,
    pub(crate) price: Decimal,
    pub(crate) restaurant: RestaurantUuid,

    /// Dish, category and restaurant are all active.
    pub(crate) is_available: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgMenuRepository;

impl PgMenuRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn get_menu_dish(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        dish: DishUuid,
    ) -> Result<Option<MenuDish>, sqlx::Error> {
        query_as::<Postgres, MenuDish>(GET_MENU_DISH_SQL)
            .bind(dish.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for MenuDish {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: DishUuid::from_uuid(row.try_get("uuid")?),
            name: row.try_get("name")?,
            price: row.try_get("price")?,
            restaurant: RestaurantUuid::from_uuid(row.try_get("restaurant_uuid")?),
            is_available: row.try_get("is_available")?,
        })
    }
}
