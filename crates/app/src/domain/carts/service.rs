//! Carts service.

use async_trait::async_trait;
use mockall::automock;
use platter::{
    roles::ORDERING_ROLES,
    validation::{
        MAX_CART_NOTE_CHARS, amount_or_removal, validate_amount, validate_price, validate_text,
    },
};
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use tracing::{Span, debug, info};

use crate::{
    database::Db,
    domain::{
        access::require_role,
        carts::{
            data::{AmountPolicy, CartLine, MenuSelection, NewCartItem},
            errors::CartsServiceError,
            records::{CartRecord, CartUuid},
            repositories::{MenuDish, PgCartItemsRepository, PgCartsRepository, PgMenuRepository},
        },
        catalog::records::{DishUuid, RestaurantUuid},
        users::{records::UserUuid, repository::PgUsersRepository},
    },
};

#[derive(Debug, Clone)]
pub struct PgCartsService {
    db: Db,
    carts: PgCartsRepository,
    items: PgCartItemsRepository,
    menu: PgMenuRepository,
    users: PgUsersRepository,
}

impl PgCartsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            carts: PgCartsRepository::new(),
            items: PgCartItemsRepository::new(),
            menu: PgMenuRepository::new(),
            users: PgUsersRepository::new(),
        }
    }

    async fn begin(
        &self,
        caller: UserUuid,
    ) -> Result<Transaction<'static, Postgres>, CartsServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        require_role(&self.users, &mut tx, caller, ORDERING_ROLES).await?;

        Ok(tx)
    }

    /// Load a cart the caller owns. Other users' carts are reported as missing.
    async fn owned_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        caller: UserUuid,
        cart: CartUuid,
    ) -> Result<CartRecord, CartsServiceError> {
        let cart = self.carts.get_cart_for_update(tx, cart).await?;

        if cart.user != caller {
            return Err(CartsServiceError::NotFound);
        }

        Ok(cart)
    }

    async fn editable_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        caller: UserUuid,
        cart: CartUuid,
    ) -> Result<CartRecord, CartsServiceError> {
        let cart = self.owned_cart(tx, caller, cart).await?;

        if !cart.status.is_editable() {
            return Err(CartsServiceError::NotEditable {
                status: cart.status,
            });
        }

        Ok(cart)
    }

    /// Dish as it may be written into a cart for `restaurant`.
    async fn menu_dish(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        restaurant: RestaurantUuid,
        dish: DishUuid,
    ) -> Result<MenuDish, CartsServiceError> {
        match self.menu.get_menu_dish(tx, dish).await? {
            Some(dish) if dish.restaurant == restaurant => Ok(dish),
            _ => Err(CartsServiceError::DishUnavailable),
        }
    }

    /// Return the caller's current cart for `restaurant`, replacing a current cart for another
    /// restaurant or one that can no longer be edited.
    async fn active_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        caller: UserUuid,
        restaurant: RestaurantUuid,
    ) -> Result<CartRecord, CartsServiceError> {
        // Serialises cart creation per user.
        self.users.get_user_for_update(tx, caller).await?;

        if let Some(current) = self.carts.get_current_cart(tx, caller).await? {
            if current.restaurant == restaurant && current.status.is_editable() {
                return Ok(current);
            }

            debug!(cart = %current.uuid, "demoting current cart");

            self.carts.demote_cart(tx, current.uuid).await?;
        }

        let cart = self
            .carts
            .create_cart(tx, CartUuid::new(), caller, restaurant)
            .await?;

        info!(cart = %cart.uuid, restaurant = %restaurant, "cart created");

        Ok(cart)
    }

    /// Recompute the stored total and reload the cart with its lines.
    async fn refreshed(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<CartRecord, CartsServiceError> {
        self.carts.recompute_total(tx, cart).await?;

        self.with_items(tx, cart).await
    }

    async fn with_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<CartRecord, CartsServiceError> {
        let mut carts = [self.carts.get_cart(tx, cart).await?];

        self.items.load_items(tx, &mut carts).await?;

        let [cart] = carts;

        Ok(cart)
    }
}

#[async_trait]
impl CartsService for PgCartsService {
    #[tracing::instrument(
        name = "carts.service.get_or_create_active_cart",
        skip(self),
        fields(caller = %caller, restaurant = %restaurant),
        err
    )]
    async fn get_or_create_active_cart(
        &self,
        caller: UserUuid,
        restaurant: RestaurantUuid,
    ) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.begin(caller).await?;

        let cart = self.active_cart(&mut tx, caller, restaurant).await?;
        let cart = self.with_items(&mut tx, cart.uuid).await?;

        tx.commit().await?;

        Ok(cart)
    }

    async fn get_current_cart(
        &self,
        caller: UserUuid,
    ) -> Result<Option<CartRecord>, CartsServiceError> {
        let mut tx = self.begin(caller).await?;

        let cart = match self.carts.get_current_cart(&mut tx, caller).await? {
            Some(cart) => Some(self.with_items(&mut tx, cart.uuid).await?),
            None => None,
        };

        tx.commit().await?;

        Ok(cart)
    }

    async fn get_cart(
        &self,
        caller: UserUuid,
        cart: CartUuid,
    ) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.begin(caller).await?;

        let cart = self.with_items(&mut tx, cart).await?;

        tx.commit().await?;

        if cart.user != caller {
            return Err(CartsServiceError::NotFound);
        }

        Ok(cart)
    }

    async fn list_carts(&self, caller: UserUuid) -> Result<Vec<CartRecord>, CartsServiceError> {
        let mut tx = self.begin(caller).await?;

        let mut carts = self.carts.list_carts(&mut tx, caller).await?;

        self.items.load_items(&mut tx, &mut carts).await?;

        tx.commit().await?;

        Ok(carts)
    }

    #[tracing::instrument(
        name = "carts.service.add_or_update_item",
        skip(self, item),
        fields(caller = %caller, cart = %cart, dish = %item.dish, amount = item.amount),
        err
    )]
    async fn add_or_update_item(
        &self,
        caller: UserUuid,
        cart: CartUuid,
        item: NewCartItem,
    ) -> Result<CartRecord, CartsServiceError> {
        let amount = validate_amount(item.amount)?;
        let price_at_time = validate_price(item.price_at_time)?;

        let mut tx = self.begin(caller).await?;

        let record = self.editable_cart(&mut tx, caller, cart).await?;
        let dish = self.menu_dish(&mut tx, record.restaurant, item.dish).await?;

        let line = CartLine {
            dish: dish.uuid,
            dish_name: dish.name,
            amount,
            price_at_time,
        };

        self.items
            .upsert_item(&mut tx, cart, &line, AmountPolicy::Absolute)
            .await?;

        let updated = self.refreshed(&mut tx, cart).await?;

        tx.commit().await?;

        Ok(updated)
    }

    #[tracing::instrument(
        name = "carts.service.add_menu_selection",
        skip(self, selection),
        fields(
            caller = %caller,
            restaurant = %restaurant,
            dish_count = selection.len(),
            cart = tracing::field::Empty
        ),
        err
    )]
    async fn add_menu_selection(
        &self,
        caller: UserUuid,
        restaurant: RestaurantUuid,
        selection: Vec<MenuSelection>,
    ) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.begin(caller).await?;

        let cart = self.active_cart(&mut tx, caller, restaurant).await?;

        Span::current().record("cart", cart.uuid.to_string());

        for picked in selection {
            let count = validate_amount(picked.count)?;
            let dish = self.menu_dish(&mut tx, restaurant, picked.dish).await?;

            if !dish.is_available {
                return Err(CartsServiceError::DishUnavailable);
            }

            let line = CartLine {
                dish: dish.uuid,
                dish_name: dish.name,
                amount: count,
                price_at_time: dish.price,
            };

            let item = self
                .items
                .upsert_item(&mut tx, cart.uuid, &line, AmountPolicy::Increment)
                .await?;

            validate_amount(item.amount)?;
        }

        let updated = self.refreshed(&mut tx, cart.uuid).await?;

        tx.commit().await?;

        Ok(updated)
    }

    async fn remove_item(
        &self,
        caller: UserUuid,
        cart: CartUuid,
        dish: DishUuid,
    ) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.begin(caller).await?;

        self.editable_cart(&mut tx, caller, cart).await?;
        self.items.delete_item(&mut tx, cart, dish).await?;

        let updated = self.refreshed(&mut tx, cart).await?;

        tx.commit().await?;

        Ok(updated)
    }

    #[tracing::instrument(
        name = "carts.service.set_amount",
        skip(self),
        fields(caller = %caller, cart = %cart, dish = %dish, amount),
        err
    )]
    async fn set_amount(
        &self,
        caller: UserUuid,
        cart: CartUuid,
        dish: DishUuid,
        amount: i64,
    ) -> Result<CartRecord, CartsServiceError> {
        let amount = amount_or_removal(amount)?;

        let mut tx = self.begin(caller).await?;

        self.editable_cart(&mut tx, caller, cart).await?;

        match amount {
            None => {
                self.items.delete_item(&mut tx, cart, dish).await?;
            }
            Some(amount) => {
                self.items
                    .update_amount(&mut tx, cart, dish, amount)
                    .await
                    .map_err(|error| match error {
                        sqlx::Error::RowNotFound => CartsServiceError::ItemNotFound,
                        error => CartsServiceError::from(error),
                    })?;
            }
        }

        let updated = self.refreshed(&mut tx, cart).await?;

        tx.commit().await?;

        Ok(updated)
    }

    async fn recompute_total(
        &self,
        caller: UserUuid,
        cart: CartUuid,
    ) -> Result<Decimal, CartsServiceError> {
        let mut tx = self.begin(caller).await?;

        self.owned_cart(&mut tx, caller, cart).await?;

        let total = self.carts.recompute_total(&mut tx, cart).await?;

        tx.commit().await?;

        Ok(total)
    }

    async fn set_note(
        &self,
        caller: UserUuid,
        cart: CartUuid,
        note: Option<String>,
    ) -> Result<CartRecord, CartsServiceError> {
        let note = validate_text(note.as_deref(), MAX_CART_NOTE_CHARS)?;

        let mut tx = self.begin(caller).await?;

        self.editable_cart(&mut tx, caller, cart).await?;
        self.carts.set_note(&mut tx, cart, note.as_deref()).await?;

        let updated = self.refreshed(&mut tx, cart).await?;

        tx.commit().await?;

        Ok(updated)
    }

    #[tracing::instrument(
        name = "carts.service.cancel_cart",
        skip(self),
        fields(caller = %caller, cart = %cart),
        err
    )]
    async fn cancel_cart(
        &self,
        caller: UserUuid,
        cart: CartUuid,
    ) -> Result<CartRecord, CartsServiceError> {
        let mut tx = self.begin(caller).await?;

        self.editable_cart(&mut tx, caller, cart).await?;
        self.carts.cancel_cart(&mut tx, cart).await?;

        let cancelled = self.with_items(&mut tx, cart).await?;

        tx.commit().await?;

        info!("cart cancelled");

        Ok(cancelled)
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// The caller's active cart for `restaurant`, creating one when needed.
    ///
    /// A current cart for a different restaurant stops being current but is kept.
    async fn get_or_create_active_cart(
        &self,
        caller: UserUuid,
        restaurant: RestaurantUuid,
    ) -> Result<CartRecord, CartsServiceError>;

    /// The cart the caller is currently filling, if any.
    async fn get_current_cart(
        &self,
        caller: UserUuid,
    ) -> Result<Option<CartRecord>, CartsServiceError>;

    /// Retrieve one of the caller's carts.
    async fn get_cart(
        &self,
        caller: UserUuid,
        cart: CartUuid,
    ) -> Result<CartRecord, CartsServiceError>;

    /// Every cart the caller has owned, newest first.
    async fn list_carts(&self, caller: UserUuid) -> Result<Vec<CartRecord>, CartsServiceError>;

    /// Write a line with an explicit amount and price, overwriting any existing line.
    async fn add_or_update_item(
        &self,
        caller: UserUuid,
        cart: CartUuid,
        item: NewCartItem,
    ) -> Result<CartRecord, CartsServiceError>;

    /// Add menu picks to the caller's active cart at current menu prices.
    ///
    /// Picks for a dish already in the cart add to its amount.
    async fn add_menu_selection(
        &self,
        caller: UserUuid,
        restaurant: RestaurantUuid,
        selection: Vec<MenuSelection>,
    ) -> Result<CartRecord, CartsServiceError>;

    /// Drop a line. Removing a line that is not there succeeds.
    async fn remove_item(
        &self,
        caller: UserUuid,
        cart: CartUuid,
        dish: DishUuid,
    ) -> Result<CartRecord, CartsServiceError>;

    /// Set a line's amount. Zero removes the line.
    async fn set_amount(
        &self,
        caller: UserUuid,
        cart: CartUuid,
        dish: DishUuid,
        amount: i64,
    ) -> Result<CartRecord, CartsServiceError>;

    /// Recalculate and store the cart total from its lines.
    async fn recompute_total(
        &self,
        caller: UserUuid,
        cart: CartUuid,
    ) -> Result<Decimal, CartsServiceError>;

    async fn set_note(
        &self,
        caller: UserUuid,
        cart: CartUuid,
        note: Option<String>,
    ) -> Result<CartRecord, CartsServiceError>;

    /// Abandon an active cart.
    async fn cancel_cart(
        &self,
        caller: UserUuid,
        cart: CartUuid,
    ) -> Result<CartRecord, CartsServiceError>;
}

#[cfg(test)]
mod tests {
    use platter::{CartStatus, validation::ValidationError};
    use testresult::TestResult;

    use crate::{domain::catalog::CatalogService, test::TestContext};

    use super::*;

    fn pick(dish: DishUuid, count: u32) -> MenuSelection {
        MenuSelection { dish, count }
    }

    #[tokio::test]
    async fn get_or_create_reuses_current_cart_for_same_restaurant() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;

        let first = ctx
            .carts
            .get_or_create_active_cart(ctx.member, menu.restaurant)
            .await?;
        let second = ctx
            .carts
            .get_or_create_active_cart(ctx.member, menu.restaurant)
            .await?;

        assert_eq!(first.uuid, second.uuid);
        assert!(second.is_current);
        assert_eq!(second.status, CartStatus::Active);

        Ok(())
    }

    #[tokio::test]
    async fn switching_restaurant_keeps_old_cart_as_history() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;
        let other = ctx.create_restaurant("Noodle Bar").await?;

        let first = ctx
            .carts
            .add_menu_selection(ctx.member, menu.restaurant, vec![pick(menu.pizza, 1)])
            .await?;
        let second = ctx
            .carts
            .get_or_create_active_cart(ctx.member, other.uuid)
            .await?;

        assert_ne!(first.uuid, second.uuid);

        let old = ctx.carts.get_cart(ctx.member, first.uuid).await?;

        assert!(!old.is_current);
        assert_eq!(old.items.len(), 1);

        let history = ctx.carts.list_carts(ctx.member).await?;

        assert_eq!(
            history.iter().map(|cart| cart.uuid).collect::<Vec<_>>(),
            vec![second.uuid, first.uuid]
        );

        Ok(())
    }

    #[tokio::test]
    async fn menu_selection_increments_and_snapshots_price() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;

        ctx.carts
            .add_menu_selection(ctx.member, menu.restaurant, vec![pick(menu.pizza, 2)])
            .await?;

        ctx.catalog
            .set_dish_price(ctx.admin, menu.pizza, Decimal::new(150, 0))
            .await?;

        let cart = ctx
            .carts
            .add_menu_selection(
                ctx.member,
                menu.restaurant,
                vec![pick(menu.pizza, 1), pick(menu.soda, 1)],
            )
            .await?;

        let pizza = cart.item(menu.pizza);

        assert_eq!(pizza.map(|item| item.amount), Some(3));
        assert_eq!(pizza.map(|item| item.price_at_time), Some(Decimal::new(150, 0)));
        assert_eq!(cart.total_price, Decimal::new(450 + 50, 0));

        Ok(())
    }

    #[tokio::test]
    async fn catalog_price_change_leaves_cart_untouched() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;

        let before = ctx
            .carts
            .add_menu_selection(ctx.member, menu.restaurant, vec![pick(menu.pizza, 1)])
            .await?;

        ctx.catalog
            .set_dish_price(ctx.admin, menu.pizza, Decimal::new(999, 0))
            .await?;

        let after = ctx.carts.get_cart(ctx.member, before.uuid).await?;

        assert_eq!(after.total_price, Decimal::new(100, 0));
        assert_eq!(
            after.item(menu.pizza).map(|item| item.price_at_time),
            Some(Decimal::new(100, 0))
        );

        Ok(())
    }

    #[tokio::test]
    async fn add_or_update_item_overwrites_line() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;
        let cart = ctx
            .carts
            .get_or_create_active_cart(ctx.member, menu.restaurant)
            .await?;

        for amount in [2, 5] {
            ctx.carts
                .add_or_update_item(
                    ctx.member,
                    cart.uuid,
                    NewCartItem {
                        dish: menu.pizza,
                        amount,
                        price_at_time: Decimal::new(10_050, 2),
                    },
                )
                .await?;
        }

        let cart = ctx.carts.get_cart(ctx.member, cart.uuid).await?;

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.item(menu.pizza).map(|item| item.amount), Some(5));
        assert_eq!(cart.total_price, Decimal::new(50_250, 2));

        Ok(())
    }

    #[tokio::test]
    async fn add_or_update_item_rejects_zero_amount() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;
        let cart = ctx
            .carts
            .get_or_create_active_cart(ctx.member, menu.restaurant)
            .await?;

        let result = ctx
            .carts
            .add_or_update_item(
                ctx.member,
                cart.uuid,
                NewCartItem {
                    dish: menu.pizza,
                    amount: 0,
                    price_at_time: Decimal::new(100, 0),
                },
            )
            .await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::Invalid(ValidationError::NonPositiveAmount))
            ),
            "expected NonPositiveAmount, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn dishes_from_another_restaurant_are_unavailable() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;
        let other = ctx.create_restaurant("Noodle Bar").await?;

        let result = ctx
            .carts
            .add_menu_selection(ctx.member, other.uuid, vec![pick(menu.pizza, 1)])
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::DishUnavailable)),
            "expected DishUnavailable, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn inactive_dishes_cannot_be_picked() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;

        ctx.catalog
            .set_dish_active(ctx.admin, menu.soda, false)
            .await?;

        let result = ctx
            .carts
            .add_menu_selection(ctx.member, menu.restaurant, vec![pick(menu.soda, 1)])
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::DishUnavailable)),
            "expected DishUnavailable, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn set_amount_handles_zero_negative_and_missing_lines() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;
        let cart = ctx
            .carts
            .add_menu_selection(ctx.member, menu.restaurant, vec![pick(menu.pizza, 2)])
            .await?;

        let negative = ctx
            .carts
            .set_amount(ctx.member, cart.uuid, menu.pizza, -1)
            .await;

        assert!(
            matches!(
                negative,
                Err(CartsServiceError::Invalid(ValidationError::NegativeAmount))
            ),
            "expected NegativeAmount, got {negative:?}"
        );

        let missing = ctx
            .carts
            .set_amount(ctx.member, cart.uuid, menu.soda, 3)
            .await;

        assert!(
            matches!(missing, Err(CartsServiceError::ItemNotFound)),
            "expected ItemNotFound, got {missing:?}"
        );

        let updated = ctx
            .carts
            .set_amount(ctx.member, cart.uuid, menu.pizza, 4)
            .await?;

        assert_eq!(updated.total_price, Decimal::new(400, 0));

        let emptied = ctx
            .carts
            .set_amount(ctx.member, cart.uuid, menu.pizza, 0)
            .await?;

        assert!(emptied.items.is_empty());
        assert_eq!(emptied.total_price, Decimal::ZERO);
        assert_eq!(emptied.status, CartStatus::Active);

        ctx.carts
            .set_amount(ctx.member, cart.uuid, menu.pizza, 0)
            .await?;

        Ok(())
    }

    #[tokio::test]
    async fn remove_item_is_idempotent() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;
        let cart = ctx
            .carts
            .add_menu_selection(ctx.member, menu.restaurant, vec![pick(menu.pizza, 1)])
            .await?;

        ctx.carts.remove_item(ctx.member, cart.uuid, menu.pizza).await?;

        let again = ctx.carts.remove_item(ctx.member, cart.uuid, menu.pizza).await?;

        assert!(again.items.is_empty());
        assert!(!again.is_attachable());
        assert!(again.is_current);

        Ok(())
    }

    #[tokio::test]
    async fn note_longer_than_limit_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;
        let cart = ctx
            .carts
            .get_or_create_active_cart(ctx.member, menu.restaurant)
            .await?;

        let result = ctx
            .carts
            .set_note(ctx.member, cart.uuid, Some("x".repeat(301)))
            .await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::Invalid(ValidationError::TextTooLong { .. }))
            ),
            "expected TextTooLong, got {result:?}"
        );

        let updated = ctx
            .carts
            .set_note(ctx.member, cart.uuid, Some("no onions".to_owned()))
            .await?;

        assert_eq!(updated.note.as_deref(), Some("no onions"));

        Ok(())
    }

    #[tokio::test]
    async fn cancelled_cart_is_not_editable() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;
        let cart = ctx
            .carts
            .add_menu_selection(ctx.member, menu.restaurant, vec![pick(menu.pizza, 1)])
            .await?;

        let cancelled = ctx.carts.cancel_cart(ctx.member, cart.uuid).await?;

        assert_eq!(cancelled.status, CartStatus::Cancelled);
        assert!(!cancelled.is_current);
        assert!(ctx.carts.get_current_cart(ctx.member).await?.is_none());

        let result = ctx
            .carts
            .set_amount(ctx.member, cart.uuid, menu.pizza, 2)
            .await;

        assert!(
            matches!(
                result,
                Err(CartsServiceError::NotEditable {
                    status: CartStatus::Cancelled
                })
            ),
            "expected NotEditable, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn other_users_carts_are_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;
        let cart = ctx
            .carts
            .add_menu_selection(ctx.member, menu.restaurant, vec![pick(menu.pizza, 1)])
            .await?;

        let read = ctx.carts.get_cart(ctx.deliverer, cart.uuid).await;
        let write = ctx
            .carts
            .remove_item(ctx.deliverer, cart.uuid, menu.pizza)
            .await;

        assert!(
            matches!(read, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {read:?}"
        );
        assert!(
            matches!(write, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {write:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn unapproved_users_cannot_order() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;
        let newcomer = ctx.register(9_001).await?;

        let result = ctx
            .carts
            .get_or_create_active_cart(newcomer, menu.restaurant)
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::Forbidden)),
            "expected Forbidden, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn recompute_total_matches_lines() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;
        let cart = ctx
            .carts
            .add_menu_selection(
                ctx.member,
                menu.restaurant,
                vec![pick(menu.pizza, 2), pick(menu.soda, 3)],
            )
            .await?;

        let total = ctx.carts.recompute_total(ctx.member, cart.uuid).await?;

        assert_eq!(total, Decimal::new(350, 0));
        assert_eq!(
            cart.items.iter().map(|item| item.line_total()).sum::<Decimal>(),
            total
        );

        Ok(())
    }
}
