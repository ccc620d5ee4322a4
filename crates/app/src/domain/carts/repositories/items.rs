//! Cart Items Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use rustc_hash::FxHashMap;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::{
    database::try_get_u32,
    domain::{
        carts::{
            data::{AmountPolicy, CartLine},
            records::{CartItemRecord, CartRecord, CartUuid},
        },
        catalog::records::DishUuid,
    },
};

const LIST_CART_ITEMS_SQL: &str = include_str!("../sql/list_cart_items.sql");
const UPSERT_CART_ITEM_SQL: &str = include_str!("../sql/upsert_cart_item.sql");
const UPDATE_CART_ITEM_AMOUNT_SQL: &str = include_str!("../sql/update_cart_item_amount.sql");
const DELETE_CART_ITEM_SQL: &str = include_str!("../sql/delete_cart_item.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartItemsRepository;

impl PgCartItemsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Attach each cart's lines, in one query for all of them.
    pub(crate) async fn load_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        carts: &mut [CartRecord],
    ) -> Result<(), sqlx::Error> {
        if carts.is_empty() {
            return Ok(());
        }

        let uuids: Vec<Uuid> = carts.iter().map(|cart| cart.uuid.into_uuid()).collect();

        let items = query_as::<Postgres, CartItemRecord>(LIST_CART_ITEMS_SQL)
            .bind(uuids)
            .fetch_all(&mut **tx)
            .await?;

        let mut by_cart: FxHashMap<CartUuid, Vec<CartItemRecord>> = FxHashMap::default();

        for item in items {
            by_cart.entry(item.cart).or_default().push(item);
        }

        for cart in carts.iter_mut() {
            cart.items = by_cart.remove(&cart.uuid).unwrap_or_default();
        }

        Ok(())
    }

    /// Insert a line, or update the existing line for the same dish according to `policy`.
    pub(crate) async fn upsert_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        line: &CartLine,
        policy: AmountPolicy,
    ) -> Result<CartItemRecord, sqlx::Error> {
        query_as::<Postgres, CartItemRecord>(UPSERT_CART_ITEM_SQL)
            .bind(cart.into_uuid())
            .bind(line.dish.into_uuid())
            .bind(&line.dish_name)
            .bind(i64::from(line.amount))
            .bind(line.price_at_time)
            .bind(policy.increments())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_amount(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        dish: DishUuid,
        amount: u32,
    ) -> Result<CartItemRecord, sqlx::Error> {
        query_as::<Postgres, CartItemRecord>(UPDATE_CART_ITEM_AMOUNT_SQL)
            .bind(cart.into_uuid())
            .bind(dish.into_uuid())
            .bind(i64::from(amount))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn delete_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        dish: DishUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_CART_ITEM_SQL)
            .bind(cart.into_uuid())
            .bind(dish.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for CartItemRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            cart: CartUuid::from_uuid(row.try_get("cart_uuid")?),
            dish: DishUuid::from_uuid(row.try_get("dish_uuid")?),
            dish_name: row.try_get("dish_name")?,
            amount: try_get_u32(row, "amount")?,
            price_at_time: row.try_get("price_at_time")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
