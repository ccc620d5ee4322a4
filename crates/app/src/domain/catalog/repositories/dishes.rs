//! Dishes Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::Decimal;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::catalog::records::{CategoryUuid, DishRecord, DishUuid};

const CREATE_DISH_SQL: &str = include_str!("../sql/create_dish.sql");
const GET_DISH_SQL: &str = include_str!("../sql/get_dish.sql");
const LIST_DISHES_SQL: &str = include_str!("../sql/list_dishes.sql");
const RENAME_DISH_SQL: &str = include_str!("../sql/rename_dish.sql");
const SET_DISH_PRICE_SQL: &str = include_str!("../sql/set_dish_price.sql");
const SET_DISH_ACTIVE_SQL: &str = include_str!("../sql/set_dish_active.sql");
const SET_DISH_DISPLAY_ORDER_SQL: &str = include_str!("../sql/set_dish_display_order.sql");
const DELETE_DISH_SQL: &str = include_str!("../sql/delete_dish.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgDishesRepository;

impl PgDishesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_dish(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        dish: DishUuid,
        category: CategoryUuid,
        name: &str,
        price: Decimal,
    ) -> Result<DishRecord, sqlx::Error> {
        query_as::<Postgres, DishRecord>(CREATE_DISH_SQL)
            .bind(dish.into_uuid())
            .bind(category.into_uuid())
            .bind(name)
            .bind(price)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_dish(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        dish: DishUuid,
    ) -> Result<DishRecord, sqlx::Error> {
        query_as::<Postgres, DishRecord>(GET_DISH_SQL)
            .bind(dish.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_dishes(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        category: CategoryUuid,
        is_active: Option<bool>,
    ) -> Result<Vec<DishRecord>, sqlx::Error> {
        query_as::<Postgres, DishRecord>(LIST_DISHES_SQL)
            .bind(category.into_uuid())
            .bind(is_active)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn rename_dish(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        dish: DishUuid,
        name: &str,
    ) -> Result<DishRecord, sqlx::Error> {
        query_as::<Postgres, DishRecord>(RENAME_DISH_SQL)
            .bind(dish.into_uuid())
            .bind(name)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn set_dish_price(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        dish: DishUuid,
        price: Decimal,
    ) -> Result<DishRecord, sqlx::Error> {
        query_as::<Postgres, DishRecord>(SET_DISH_PRICE_SQL)
            .bind(dish.into_uuid())
            .bind(price)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn set_dish_active(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        dish: DishUuid,
        is_active: bool,
    ) -> Result<DishRecord, sqlx::Error> {
        query_as::<Postgres, DishRecord>(SET_DISH_ACTIVE_SQL)
            .bind(dish.into_uuid())
            .bind(is_active)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn set_dish_display_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        dish: DishUuid,
        display_order: i32,
    ) -> Result<DishRecord, sqlx::Error> {
        query_as::<Postgres, DishRecord>(SET_DISH_DISPLAY_ORDER_SQL)
            .bind(dish.into_uuid())
            .bind(display_order)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_dish(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        dish: DishUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_DISH_SQL)
            .bind(dish.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for DishRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: DishUuid::from_uuid(row.try_get("uuid")?),
            category: CategoryUuid::from_uuid(row.try_get("category_uuid")?),
            name: row.try_get("name")?,
            price: row.try_get("price")?,
            display_order: row.try_get("display_order")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
