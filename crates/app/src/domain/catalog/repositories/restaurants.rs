//! Restaurants Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use crate::domain::catalog::records::{RestaurantRecord, RestaurantUuid};

const CREATE_RESTAURANT_SQL: &str = include_str!("../sql/create_restaurant.sql");
const GET_RESTAURANT_SQL: &str = include_str!("../sql/get_restaurant.sql");
const LIST_RESTAURANTS_SQL: &str = include_str!("../sql/list_restaurants.sql");
const RENAME_RESTAURANT_SQL: &str = include_str!("../sql/rename_restaurant.sql");
const SET_RESTAURANT_ACTIVE_SQL: &str = include_str!("../sql/set_restaurant_active.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgRestaurantsRepository;

impl PgRestaurantsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_restaurant(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        restaurant: RestaurantUuid,
        name: &str,
    ) -> Result<RestaurantRecord, sqlx::Error> {
        query_as::<Postgres, RestaurantRecord>(CREATE_RESTAURANT_SQL)
            .bind(restaurant.into_uuid())
            .bind(name)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_restaurant(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        restaurant: RestaurantUuid,
    ) -> Result<RestaurantRecord, sqlx::Error> {
        query_as::<Postgres, RestaurantRecord>(GET_RESTAURANT_SQL)
            .bind(restaurant.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_restaurants(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        is_active: Option<bool>,
    ) -> Result<Vec<RestaurantRecord>, sqlx::Error> {
        query_as::<Postgres, RestaurantRecord>(LIST_RESTAURANTS_SQL)
            .bind(is_active)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn rename_restaurant(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        restaurant: RestaurantUuid,
        name: &str,
    ) -> Result<RestaurantRecord, sqlx::Error> {
        query_as::<Postgres, RestaurantRecord>(RENAME_RESTAURANT_SQL)
            .bind(restaurant.into_uuid())
            .bind(name)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn set_restaurant_active(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        restaurant: RestaurantUuid,
        is_active: bool,
    ) -> Result<RestaurantRecord, sqlx::Error> {
        query_as::<Postgres, RestaurantRecord>(SET_RESTAURANT_ACTIVE_SQL)
            .bind(restaurant.into_uuid())
            .bind(is_active)
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for RestaurantRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: RestaurantUuid::from_uuid(row.try_get("uuid")?),
            name: row.try_get("name")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
