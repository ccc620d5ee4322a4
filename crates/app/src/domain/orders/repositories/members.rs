//! Carts belonging to a delivery order.

use platter::summary::{CategoryRef, SummaryLine};
use sqlx::{Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::{
    database::try_get_u32,
    domain::{
        carts::records::{CartRecord, CartUuid},
        orders::records::OrderUuid,
    },
};

const ATTACH_CART_SQL: &str = include_str!("../sql/attach_cart.sql");
const DETACH_CART_SQL: &str = include_str!("../sql/detach_cart.sql");
const RELEASE_ORDER_CARTS_SQL: &str = include_str!("../sql/release_order_carts.sql");
const DELIVER_ORDER_CARTS_SQL: &str = include_str!("../sql/deliver_order_carts.sql");
const LIST_ORDER_CARTS_SQL: &str = include_str!("../sql/list_order_carts.sql");
const LIST_SUMMARY_LINES_SQL: &str = include_str!("../sql/list_summary_lines.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrderCartsRepository;

impl PgOrderCartsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Mark a cart as ordered under `order`. It stops being its owner's current cart.
    pub(crate) async fn attach_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        order: OrderUuid,
    ) -> Result<CartRecord, sqlx::Error> {
        query_as::<Postgres, CartRecord>(ATTACH_CART_SQL)
            .bind(cart.into_uuid())
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn detach_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<CartRecord, sqlx::Error> {
        query_as::<Postgres, CartRecord>(DETACH_CART_SQL)
            .bind(cart.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Return every ordered cart of `order` to its owner as an active cart.
    pub(crate) async fn release_carts(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(RELEASE_ORDER_CARTS_SQL)
            .bind(order.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    pub(crate) async fn deliver_carts(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELIVER_ORDER_CARTS_SQL)
            .bind(order.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Carts counted towards `order`, oldest first.
    pub(crate) async fn list_carts(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Vec<CartRecord>, sqlx::Error> {
        query_as::<Postgres, CartRecord>(LIST_ORDER_CARTS_SQL)
            .bind(order.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    /// Every line of every counted cart, with the dish's current category when it still has one.
    pub(crate) async fn list_summary_lines(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Vec<SummaryLine>, sqlx::Error> {
        let rows = query(LIST_SUMMARY_LINES_SQL)
            .bind(order.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        rows.iter().map(summary_line).collect()
    }
}

fn summary_line(row: &PgRow) -> sqlx::Result<SummaryLine> {
    let category = match row.try_get::<Option<Uuid>, _>("category_uuid")? {
        Some(uuid) => Some(CategoryRef {
            uuid,
            name: row.try_get("category_name")?,
            display_order: row.try_get("category_display_order")?,
        }),
        None => None,
    };

    Ok(SummaryLine {
        dish: row.try_get("dish_uuid")?,
        dish_name: row.try_get("dish_name")?,
        category,
        amount: try_get_u32(row, "amount")?,
        unit_price: row.try_get("price_at_time")?,
    })
}
