//! Categories Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use crate::domain::catalog::records::{CategoryRecord, CategoryUuid, RestaurantUuid};

const CREATE_CATEGORY_SQL: &str = include_str!("../sql/create_category.sql");
const GET_CATEGORY_SQL: &str = include_str!("../sql/get_category.sql");
const LIST_CATEGORIES_SQL: &str = include_str!("../sql/list_categories.sql");
const RENAME_CATEGORY_SQL: &str = include_str!("../sql/rename_category.sql");
const SET_CATEGORY_ACTIVE_SQL: &str = include_str!("../sql/set_category_active.sql");
const SET_CATEGORY_DISPLAY_ORDER_SQL: &str = include_str!("../sql/set_category_display_order.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCategoriesRepository;

impl PgCategoriesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Insert a category after the restaurant's last one.
    pub(crate) async fn create_category(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        category: CategoryUuid,
        restaurant: RestaurantUuid,
        name: &str,
    ) -> Result<CategoryRecord, sqlx::Error> {
        query_as::<Postgres, CategoryRecord>(CREATE_CATEGORY_SQL)
            .bind(category.into_uuid())
            .bind(restaurant.into_uuid())
            .bind(name)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_category(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        category: CategoryUuid,
    ) -> Result<CategoryRecord, sqlx::Error> {
        query_as::<Postgres, CategoryRecord>(GET_CATEGORY_SQL)
            .bind(category.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_categories(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        restaurant: RestaurantUuid,
        is_active: Option<bool>,
    ) -> Result<Vec<CategoryRecord>, sqlx::Error> {
        query_as::<Postgres, CategoryRecord>(LIST_CATEGORIES_SQL)
            .bind(restaurant.into_uuid())
            .bind(is_active)
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn rename_category(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        category: CategoryUuid,
        name: &str,
    ) -> Result<CategoryRecord, sqlx::Error> {
        query_as::<Postgres, CategoryRecord>(RENAME_CATEGORY_SQL)
            .bind(category.into_uuid())
            .bind(name)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn set_category_active(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        category: CategoryUuid,
        is_active: bool,
    ) -> Result<CategoryRecord, sqlx::Error> {
        query_as::<Postgres, CategoryRecord>(SET_CATEGORY_ACTIVE_SQL)
            .bind(category.into_uuid())
            .bind(is_active)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn set_category_display_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        category: CategoryUuid,
        display_order: i32,
    ) -> Result<CategoryRecord, sqlx::Error> {
        query_as::<Postgres, CategoryRecord>(SET_CATEGORY_DISPLAY_ORDER_SQL)
            .bind(category.into_uuid())
            .bind(display_order)
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for CategoryRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: CategoryUuid::from_uuid(row.try_get("uuid")?),
            restaurant: RestaurantUuid::from_uuid(row.try_get("restaurant_uuid")?),
            name: row.try_get("name")?,
            display_order: row.try_get("display_order")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
