//! Carts Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use rust_decimal::Decimal;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};

use crate::{
    database::try_get_parsed,
    domain::{
        carts::records::{CartRecord, CartUuid},
        catalog::records::RestaurantUuid,
        orders::records::OrderUuid,
        users::records::UserUuid,
    },
};

const GET_CART_SQL: &str = include_str!("../sql/get_cart.sql");
const GET_CART_FOR_UPDATE_SQL: &str = include_str!("../sql/get_cart_for_update.sql");
const GET_CURRENT_CART_SQL: &str = include_str!("../sql/get_current_cart.sql");
const LIST_CARTS_SQL: &str = include_str!("../sql/list_carts.sql");
const CREATE_CART_SQL: &str = include_str!("../sql/create_cart.sql");
const DEMOTE_CART_SQL: &str = include_str!("../sql/demote_cart.sql");
const SET_CART_NOTE_SQL: &str = include_str!("../sql/set_cart_note.sql");
const CANCEL_CART_SQL: &str = include_str!("../sql/cancel_cart.sql");
const RECOMPUTE_CART_TOTAL_SQL: &str = include_str!("../sql/recompute_cart_total.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartsRepository;

impl PgCartsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Fetch a cart header. Items are loaded separately.
    pub(crate) async fn get_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<CartRecord, sqlx::Error> {
        query_as::<Postgres, CartRecord>(GET_CART_SQL)
            .bind(cart.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_cart_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<CartRecord, sqlx::Error> {
        query_as::<Postgres, CartRecord>(GET_CART_FOR_UPDATE_SQL)
            .bind(cart.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_current_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Option<CartRecord>, sqlx::Error> {
        query_as::<Postgres, CartRecord>(GET_CURRENT_CART_SQL)
            .bind(user.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn list_carts(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Vec<CartRecord>, sqlx::Error> {
        query_as::<Postgres, CartRecord>(LIST_CARTS_SQL)
            .bind(user.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn create_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        user: UserUuid,
        restaurant: RestaurantUuid,
    ) -> Result<CartRecord, sqlx::Error> {
        query_as::<Postgres, CartRecord>(CREATE_CART_SQL)
            .bind(cart.into_uuid())
            .bind(user.into_uuid())
            .bind(restaurant.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Clear the current flag. The cart itself is kept as history.
    pub(crate) async fn demote_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<(), sqlx::Error> {
        query(DEMOTE_CART_SQL)
            .bind(cart.into_uuid())
            .execute(&mut **tx)
            .await?;

        Ok(())
    }

    pub(crate) async fn set_note(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        note: Option<&str>,
    ) -> Result<CartRecord, sqlx::Error> {
        query_as::<Postgres, CartRecord>(SET_CART_NOTE_SQL)
            .bind(cart.into_uuid())
            .bind(note)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn cancel_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<CartRecord, sqlx::Error> {
        query_as::<Postgres, CartRecord>(CANCEL_CART_SQL)
            .bind(cart.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Store `Σ amount × price_at_time` over the cart's lines and return it.
    pub(crate) async fn recompute_total(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<Decimal, sqlx::Error> {
        query_scalar::<Postgres, Decimal>(RECOMPUTE_CART_TOTAL_SQL)
            .bind(cart.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for CartRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: CartUuid::from_uuid(row.try_get("uuid")?),
            user: UserUuid::from_uuid(row.try_get("user_uuid")?),
            restaurant: RestaurantUuid::from_uuid(row.try_get("restaurant_uuid")?),
            delivery_order: row
                .try_get::<Option<uuid::Uuid>, _>("delivery_order_uuid")?
                .map(OrderUuid::from_uuid),
            status: try_get_parsed(row, "status")?,
            note: row.try_get("note")?,
            is_current: row.try_get("is_current")?,
            total_price: row.try_get("total_price")?,
            items: Vec::new(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
