//! Delivery Orders Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use platter::{OrderStatus, PaymentMethod};
use rust_decimal::Decimal;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};

use crate::{
    database::{try_get_parsed, try_get_parsed_opt},
    domain::{
        catalog::records::RestaurantUuid,
        orders::records::{OrderRecord, OrderUuid},
        users::records::UserUuid,
    },
};

const CREATE_ORDER_SQL: &str = include_str!("../sql/create_order.sql");
const GET_ORDER_SQL: &str = include_str!("../sql/get_order.sql");
const GET_ORDER_FOR_UPDATE_SQL: &str = include_str!("../sql/get_order_for_update.sql");
const LIST_COLLECTING_ORDERS_SQL: &str = include_str!("../sql/list_collecting_orders.sql");
const LIST_MY_ORDERS_SQL: &str = include_str!("../sql/list_my_orders.sql");
const SET_ORDER_STATUS_SQL: &str = include_str!("../sql/set_order_status.sql");
const ASSIGN_DELIVERY_PERSON_SQL: &str = include_str!("../sql/assign_delivery_person.sql");
const RECOMPUTE_ORDER_TOTAL_SQL: &str = include_str!("../sql/recompute_order_total.sql");
const DELETE_ORDER_SQL: &str = include_str!("../sql/delete_order.sql");

/// Validated order fields, ready to store.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OrderRow<'a> {
    pub(crate) uuid: OrderUuid,
    pub(crate) restaurant: RestaurantUuid,
    pub(crate) creator: UserUuid,
    pub(crate) phone_number: Option<&'a str>,
    pub(crate) payment_method: Option<PaymentMethod>,
    pub(crate) notes: Option<&'a str>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderRow<'_>,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(CREATE_ORDER_SQL)
            .bind(order.uuid.into_uuid())
            .bind(order.restaurant.into_uuid())
            .bind(order.creator.into_uuid())
            .bind(order.phone_number)
            .bind(order.payment_method.map(PaymentMethod::as_str))
            .bind(order.notes)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(GET_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Fetch and lock an order. Concurrent writers to the same order wait here.
    pub(crate) async fn get_order_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(GET_ORDER_FOR_UPDATE_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_collecting_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        restaurant: RestaurantUuid,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LIST_COLLECTING_ORDERS_SQL)
            .bind(restaurant.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn list_my_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
        limit: u32,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(LIST_MY_ORDERS_SQL)
            .bind(user.into_uuid())
            .bind(i64::from(limit))
            .fetch_all(&mut **tx)
            .await
    }

    /// Store a new status and stamp the matching timestamp.
    pub(crate) async fn set_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(SET_ORDER_STATUS_SQL)
            .bind(order.into_uuid())
            .bind(status.as_str())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn assign_delivery_person(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        user: UserUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(ASSIGN_DELIVERY_PERSON_SQL)
            .bind(order.into_uuid())
            .bind(user.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Re-aggregate the order total from its counted carts.
    pub(crate) async fn recompute_total(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Decimal, sqlx::Error> {
        query_scalar::<Postgres, Decimal>(RECOMPUTE_ORDER_TOTAL_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_ORDER_SQL)
            .bind(order.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for OrderRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            restaurant: RestaurantUuid::from_uuid(row.try_get("restaurant_uuid")?),
            creator: UserUuid::from_uuid(row.try_get("creator_uuid")?),
            delivery_person: UserUuid::from_uuid(row.try_get("delivery_person_uuid")?),
            status: try_get_parsed(row, "status")?,
            phone_number: row.try_get("phone_number")?,
            payment_method: try_get_parsed_opt(row, "payment_method")?,
            total_amount: row.try_get("total_amount")?,
            notes: row.try_get("notes")?,
            collected_at: try_get_timestamp_opt(row, "collected_at")?,
            delivered_at: try_get_timestamp_opt(row, "delivered_at")?,
            cancelled_at: try_get_timestamp_opt(row, "cancelled_at")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

fn try_get_timestamp_opt(row: &PgRow, col: &str) -> sqlx::Result<Option<jiff::Timestamp>> {
    Ok(row
        .try_get::<Option<SqlxTimestamp>, _>(col)?
        .map(SqlxTimestamp::to_jiff))
}
