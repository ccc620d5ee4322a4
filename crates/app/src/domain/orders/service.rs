//! Delivery orders service.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use platter::{
    OrderStatus,
    roles::{ORDER_MANAGERS, ORDERING_ROLES, role_allows},
    summary::ConsolidatedSummary,
    validation::{MAX_ORDER_NOTES_CHARS, normalize_phone, validate_text},
};
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use tracing::{Span, debug, info};

use crate::{
    database::Db,
    domain::{
        access::require_role,
        carts::{
            records::{CartRecord, CartUuid},
            repositories::{PgCartItemsRepository, PgCartsRepository},
        },
        catalog::{records::RestaurantUuid, repositories::PgRestaurantsRepository},
        orders::{
            data::NewOrder,
            errors::OrdersServiceError,
            records::{OrderCart, OrderRecord, OrderUuid},
            repositories::{OrderRow, PgOrderCartsRepository, PgOrdersRepository},
        },
        users::{
            records::{UserRecord, UserUuid},
            repository::PgUsersRepository,
        },
    },
    notifications::{Notification, Notifier, fan_out},
};

#[derive(Clone)]
pub struct PgOrdersService {
    db: Db,
    orders: PgOrdersRepository,
    members: PgOrderCartsRepository,
    carts: PgCartsRepository,
    items: PgCartItemsRepository,
    restaurants: PgRestaurantsRepository,
    users: PgUsersRepository,
    notifier: Arc<dyn Notifier>,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            db,
            orders: PgOrdersRepository::new(),
            members: PgOrderCartsRepository::new(),
            carts: PgCartsRepository::new(),
            items: PgCartItemsRepository::new(),
            restaurants: PgRestaurantsRepository::new(),
            users: PgUsersRepository::new(),
            notifier,
        }
    }

    /// Lock an order the caller may manage.
    ///
    /// Delivery users manage the orders they created or deliver; administrators manage all.
    async fn managed_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        caller: &UserRecord,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let order = self.orders.get_order_for_update(tx, order).await?;

        if !can_manage(caller, &order) {
            debug!(caller = %caller.uuid, order = %order.uuid, "order belongs to another deliverer");

            return Err(OrdersServiceError::Forbidden);
        }

        Ok(order)
    }

    async fn cart_with_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<CartRecord, OrdersServiceError> {
        let cart = self
            .carts
            .get_cart_for_update(tx, cart)
            .await
            .map_err(cart_error)?;

        let mut carts = [cart];

        self.items.load_items(tx, &mut carts).await?;

        let [cart] = carts;

        Ok(cart)
    }

    async fn summary(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<ConsolidatedSummary, OrdersServiceError> {
        let lines = self.members.list_summary_lines(tx, order).await?;

        Ok(ConsolidatedSummary::from_lines(lines))
    }

    /// Recompute the order total and return the fresh order.
    async fn refreshed(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let total = self.orders.recompute_total(tx, order).await?;

        debug!(order = %order, total = %total, "order total recomputed");

        Ok(self.orders.get_order(tx, order).await?)
    }
}

fn can_manage(caller: &UserRecord, order: &OrderRecord) -> bool {
    caller.role.is_privileged() || order.is_managed_by(caller.uuid)
}

fn cart_error(error: sqlx::Error) -> OrdersServiceError {
    match error {
        sqlx::Error::RowNotFound => OrdersServiceError::CartNotFound,
        error => OrdersServiceError::from(error),
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    #[tracing::instrument(
        name = "orders.service.create_order",
        skip(self, order),
        fields(caller = %caller, order = %order.uuid, restaurant = %order.restaurant),
        err
    )]
    async fn create_order(
        &self,
        caller: UserUuid,
        order: NewOrder,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let phone_number = order
            .phone_number
            .as_deref()
            .map(normalize_phone)
            .transpose()?;
        let notes = validate_text(order.notes.as_deref(), MAX_ORDER_NOTES_CHARS)?;

        let mut tx = self.db.begin_transaction().await?;

        let deliverer = require_role(&self.users, &mut tx, caller, ORDER_MANAGERS).await?;

        let restaurant = self
            .restaurants
            .get_restaurant(&mut tx, order.restaurant)
            .await
            .map_err(|error| match error {
                sqlx::Error::RowNotFound => OrdersServiceError::InvalidReference,
                error => OrdersServiceError::from(error),
            })?;

        let created = self
            .orders
            .create_order(
                &mut tx,
                OrderRow {
                    uuid: order.uuid,
                    restaurant: order.restaurant,
                    creator: caller,
                    phone_number: phone_number.as_deref(),
                    payment_method: order.payment_method,
                    notes: notes.as_deref(),
                },
            )
            .await?;

        let recipients = self
            .users
            .list_active_users(&mut tx, ORDERING_ROLES, &[caller])
            .await?;

        tx.commit().await?;

        info!(restaurant = %restaurant.name, "order opened");

        let notification = Notification::OrderOpened {
            order: created.uuid,
            restaurant: restaurant.name,
            deliverer: deliverer.display_name(),
            phone_number: created.phone_number.clone(),
            payment_method: created.payment_method,
            notes: created.notes.clone(),
        };

        fan_out(self.notifier.as_ref(), &recipients, &notification).await;

        Ok(created)
    }

    #[tracing::instrument(
        name = "orders.service.attach_cart",
        skip(self),
        fields(caller = %caller, cart = %cart, order = %order, total = tracing::field::Empty),
        err
    )]
    async fn attach_cart(
        &self,
        caller: UserUuid,
        cart: CartUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        require_role(&self.users, &mut tx, caller, ORDERING_ROLES).await?;

        // Order first: attaches to one order queue behind this lock.
        let locked = self.orders.get_order_for_update(&mut tx, order).await?;
        let cart = self.cart_with_items(&mut tx, cart).await?;

        if cart.user != caller {
            return Err(OrdersServiceError::CartNotFound);
        }

        if !locked.status.accepts_carts() {
            return Err(OrdersServiceError::NotAccepting {
                status: locked.status,
            });
        }

        if cart.restaurant != locked.restaurant {
            return Err(OrdersServiceError::RestaurantMismatch);
        }

        if !cart.is_attachable() {
            return Err(OrdersServiceError::CartNotAttachable {
                status: cart.status,
                item_count: cart.items.len(),
            });
        }

        self.members.attach_cart(&mut tx, cart.uuid, order).await?;

        let updated = self.refreshed(&mut tx, order).await?;

        tx.commit().await?;

        Span::current().record("total", updated.total_amount.to_string());

        info!("cart attached");

        Ok(updated)
    }

    #[tracing::instrument(
        name = "orders.service.detach_cart",
        skip(self),
        fields(caller = %caller, cart = %cart),
        err
    )]
    async fn detach_cart(
        &self,
        caller: UserUuid,
        cart: CartUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let user = require_role(&self.users, &mut tx, caller, ORDERING_ROLES).await?;

        let order = self
            .carts
            .get_cart(&mut tx, cart)
            .await
            .map_err(cart_error)?
            .delivery_order
            .ok_or(OrdersServiceError::CartNotInOrder)?;

        let locked = self.orders.get_order_for_update(&mut tx, order).await?;
        let record = self
            .carts
            .get_cart_for_update(&mut tx, cart)
            .await
            .map_err(cart_error)?;

        let is_owner = record.user == caller;
        let is_manager = role_allows(user.role, ORDER_MANAGERS) && can_manage(&user, &locked);

        if !is_owner && !is_manager {
            return Err(OrdersServiceError::CartNotFound);
        }

        if record.delivery_order != Some(order) {
            return Err(OrdersServiceError::CartNotInOrder);
        }

        if !locked.status.accepts_carts() {
            return Err(OrdersServiceError::NotAccepting {
                status: locked.status,
            });
        }

        self.members.detach_cart(&mut tx, cart).await?;

        let updated = self.refreshed(&mut tx, order).await?;

        tx.commit().await?;

        info!(order = %order, "cart detached");

        Ok(updated)
    }

    async fn recompute_order_total(
        &self,
        caller: UserUuid,
        order: OrderUuid,
    ) -> Result<Decimal, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let user = require_role(&self.users, &mut tx, caller, ORDER_MANAGERS).await?;

        self.managed_order(&mut tx, &user, order).await?;

        let total = self.orders.recompute_total(&mut tx, order).await?;

        tx.commit().await?;

        Ok(total)
    }

    #[tracing::instrument(
        name = "orders.service.set_status",
        skip(self),
        fields(caller = %caller, order = %order, from = tracing::field::Empty, to = %status),
        err
    )]
    async fn set_status(
        &self,
        caller: UserUuid,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let user = require_role(&self.users, &mut tx, caller, ORDER_MANAGERS).await?;

        let locked = self.managed_order(&mut tx, &user, order).await?;

        Span::current().record("from", locked.status.as_str());

        let next = locked.status.transition(status)?;

        match next {
            OrderStatus::Delivered => {
                let delivered = self.members.deliver_carts(&mut tx, order).await?;

                debug!(carts = delivered, "carts delivered");
            }
            OrderStatus::Cancelled => {
                let released = self.members.release_carts(&mut tx, order).await?;

                debug!(carts = released, "carts released");
            }
            OrderStatus::Collecting | OrderStatus::Collected => {}
        }

        self.orders.set_status(&mut tx, order, next).await?;

        let updated = self.refreshed(&mut tx, order).await?;

        let collected = if next == OrderStatus::Collected {
            let summary = self.summary(&mut tx, order).await?;
            let deliverer = self.users.get_user(&mut tx, updated.delivery_person).await?;
            let restaurant = self
                .restaurants
                .get_restaurant(&mut tx, updated.restaurant)
                .await?;

            Some((deliverer, restaurant.name, summary))
        } else {
            None
        };

        tx.commit().await?;

        info!(status = %next, "order status changed");

        if let Some((deliverer, restaurant, summary)) = collected {
            let notification = Notification::OrderCollected {
                order,
                restaurant,
                total_amount: updated.total_amount,
                summary,
            };

            fan_out(self.notifier.as_ref(), &[deliverer], &notification).await;
        }

        Ok(updated)
    }

    #[tracing::instrument(
        name = "orders.service.assign_delivery_person",
        skip(self),
        fields(caller = %caller, order = %order, delivery_person = %delivery_person),
        err
    )]
    async fn assign_delivery_person(
        &self,
        caller: UserUuid,
        order: OrderUuid,
        delivery_person: UserUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let user = require_role(&self.users, &mut tx, caller, ORDER_MANAGERS).await?;

        let locked = self.managed_order(&mut tx, &user, order).await?;

        if locked.status.is_terminal() {
            return Err(OrdersServiceError::NotAccepting {
                status: locked.status,
            });
        }

        let target = self
            .users
            .get_user(&mut tx, delivery_person)
            .await
            .map_err(|error| match error {
                sqlx::Error::RowNotFound => OrdersServiceError::InvalidReference,
                error => OrdersServiceError::from(error),
            })?;

        if !target.is_active || !role_allows(target.role, ORDER_MANAGERS) {
            return Err(OrdersServiceError::NotOrderManager { role: target.role });
        }

        let updated = self
            .orders
            .assign_delivery_person(&mut tx, order, delivery_person)
            .await?;

        tx.commit().await?;

        info!("delivery person assigned");

        Ok(updated)
    }

    async fn build_consolidated_summary(
        &self,
        caller: UserUuid,
        order: OrderUuid,
    ) -> Result<ConsolidatedSummary, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let user = require_role(&self.users, &mut tx, caller, ORDER_MANAGERS).await?;

        self.managed_order(&mut tx, &user, order).await?;

        let summary = self.summary(&mut tx, order).await?;

        tx.commit().await?;

        Ok(summary)
    }

    async fn list_order_carts(
        &self,
        caller: UserUuid,
        order: OrderUuid,
    ) -> Result<Vec<OrderCart>, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let user = require_role(&self.users, &mut tx, caller, ORDER_MANAGERS).await?;

        self.managed_order(&mut tx, &user, order).await?;

        let mut carts = self.members.list_carts(&mut tx, order).await?;

        self.items.load_items(&mut tx, &mut carts).await?;

        let mut breakdown = Vec::with_capacity(carts.len());

        for cart in carts {
            let owner = self.users.get_user(&mut tx, cart.user).await?;

            breakdown.push(OrderCart { owner, cart });
        }

        tx.commit().await?;

        Ok(breakdown)
    }

    async fn get_order(
        &self,
        caller: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        require_role(&self.users, &mut tx, caller, ORDERING_ROLES).await?;

        let order = self.orders.get_order(&mut tx, order).await?;

        tx.commit().await?;

        Ok(order)
    }

    async fn list_collecting_orders(
        &self,
        caller: UserUuid,
        restaurant: RestaurantUuid,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        require_role(&self.users, &mut tx, caller, ORDERING_ROLES).await?;

        let orders = self
            .orders
            .list_collecting_orders(&mut tx, restaurant)
            .await?;

        tx.commit().await?;

        Ok(orders)
    }

    async fn list_my_orders(
        &self,
        caller: UserUuid,
        limit: u32,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        require_role(&self.users, &mut tx, caller, ORDER_MANAGERS).await?;

        let orders = self.orders.list_my_orders(&mut tx, caller, limit).await?;

        tx.commit().await?;

        Ok(orders)
    }

    #[tracing::instrument(
        name = "orders.service.delete_order",
        skip(self),
        fields(caller = %caller, order = %order),
        err
    )]
    async fn delete_order(&self, caller: UserUuid, order: OrderUuid) -> Result<(), OrdersServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let user = require_role(&self.users, &mut tx, caller, ORDER_MANAGERS).await?;

        let locked = self.managed_order(&mut tx, &user, order).await?;

        // Deleting stands in for cancelling an order nobody has committed to yet.
        if locked.status != OrderStatus::Collecting {
            return Err(OrdersServiceError::InvalidTransition(
                platter::InvalidTransition {
                    from: locked.status,
                    to: OrderStatus::Cancelled,
                },
            ));
        }

        let released = self.members.release_carts(&mut tx, order).await?;
        let rows_affected = self.orders.delete_order(&mut tx, order).await?;

        if rows_affected == 0 {
            return Err(OrdersServiceError::NotFound);
        }

        tx.commit().await?;

        info!(released, "order deleted");

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Open a new order collecting carts for one restaurant, delivered by the caller.
    ///
    /// Every other active user is told the order is open.
    async fn create_order(
        &self,
        caller: UserUuid,
        order: NewOrder,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Join one of the caller's carts to a collecting order.
    async fn attach_cart(
        &self,
        caller: UserUuid,
        cart: CartUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Take a cart back out of a collecting order. The cart becomes editable again.
    async fn detach_cart(
        &self,
        caller: UserUuid,
        cart: CartUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Recalculate and store the order total from its carts.
    async fn recompute_order_total(
        &self,
        caller: UserUuid,
        order: OrderUuid,
    ) -> Result<Decimal, OrdersServiceError>;

    /// Move an order through its lifecycle.
    ///
    /// Delivering an order delivers its carts; cancelling it returns them to their owners.
    async fn set_status(
        &self,
        caller: UserUuid,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Hand an order over to another deliverer.
    async fn assign_delivery_person(
        &self,
        caller: UserUuid,
        order: OrderUuid,
        delivery_person: UserUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Shopping list for the order, grouped by category.
    async fn build_consolidated_summary(
        &self,
        caller: UserUuid,
        order: OrderUuid,
    ) -> Result<ConsolidatedSummary, OrdersServiceError>;

    /// Each counted cart together with its owner.
    async fn list_order_carts(
        &self,
        caller: UserUuid,
        order: OrderUuid,
    ) -> Result<Vec<OrderCart>, OrdersServiceError>;

    async fn get_order(
        &self,
        caller: UserUuid,
        order: OrderUuid,
    ) -> Result<OrderRecord, OrdersServiceError>;

    /// Orders for `restaurant` that still accept carts, newest first.
    async fn list_collecting_orders(
        &self,
        caller: UserUuid,
        restaurant: RestaurantUuid,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError>;

    /// Orders the caller created or delivers, newest first.
    async fn list_my_orders(
        &self,
        caller: UserUuid,
        limit: u32,
    ) -> Result<Vec<OrderRecord>, OrdersServiceError>;

    /// Remove a collecting order, returning its carts to their owners.
    async fn delete_order(&self, caller: UserUuid, order: OrderUuid) -> Result<(), OrdersServiceError>;
}

#[cfg(test)]
mod tests {
    use platter::{CartStatus, InvalidTransition, PaymentMethod, Role};
    use testresult::TestResult;

    use crate::{
        domain::{
            carts::{CartsService, data::MenuSelection},
            catalog::CatalogService,
            users::UsersService,
        },
        notifications::Notification,
        test::TestContext,
    };

    use super::*;

    async fn filled_cart(
        ctx: &TestContext,
        user: UserUuid,
        restaurant: RestaurantUuid,
        picks: &[(crate::domain::catalog::records::DishUuid, u32)],
    ) -> TestResult<CartRecord> {
        let selection = picks
            .iter()
            .map(|&(dish, count)| MenuSelection { dish, count })
            .collect();

        Ok(ctx
            .carts
            .add_menu_selection(user, restaurant, selection)
            .await?)
    }

    #[tokio::test]
    async fn happy_path_order_totals_and_delivers_carts() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;

        let first = filled_cart(&ctx, ctx.member, menu.restaurant, &[(menu.pizza, 2)]).await?;
        let second = filled_cart(&ctx, ctx.admin, menu.restaurant, &[(menu.soda, 1)]).await?;

        assert_eq!(first.total_price, Decimal::new(200, 0));
        assert_eq!(second.total_price, Decimal::new(50, 0));

        let order = ctx
            .orders
            .create_order(ctx.deliverer, NewOrder::for_restaurant(menu.restaurant))
            .await?;

        assert_eq!(order.status, OrderStatus::Collecting);
        assert_eq!(order.delivery_person, ctx.deliverer);

        ctx.orders.attach_cart(ctx.member, first.uuid, order.uuid).await?;

        let attached = ctx
            .orders
            .attach_cart(ctx.admin, second.uuid, order.uuid)
            .await?;

        assert_eq!(attached.total_amount, Decimal::new(250, 0));

        ctx.orders
            .set_status(ctx.deliverer, order.uuid, OrderStatus::Collected)
            .await?;

        let delivered = ctx
            .orders
            .set_status(ctx.deliverer, order.uuid, OrderStatus::Delivered)
            .await?;

        assert_eq!(delivered.total_amount, Decimal::new(250, 0));
        assert!(delivered.collected_at.is_some());
        assert!(delivered.delivered_at.is_some());

        for (user, cart) in [(ctx.member, first.uuid), (ctx.admin, second.uuid)] {
            let cart = ctx.carts.get_cart(user, cart).await?;

            assert_eq!(cart.status, CartStatus::Delivered);
            assert_eq!(cart.delivery_order, Some(order.uuid));
        }

        Ok(())
    }

    #[tokio::test]
    async fn create_order_notifies_everyone_but_the_deliverer() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;

        ctx.orders
            .create_order(
                ctx.deliverer,
                NewOrder {
                    phone_number: Some("+7 (916) 123-45-67".to_owned()),
                    payment_method: Some(PaymentMethod::Sber),
                    ..NewOrder::for_restaurant(menu.restaurant)
                },
            )
            .await?;

        let to_member = ctx.notifier.sent_to(ctx.member);

        assert!(
            matches!(
                to_member.as_slice(),
                [Notification::OrderOpened { phone_number: Some(phone), .. }]
                    if phone == "89161234567"
            ),
            "expected order opened notice, got {to_member:?}"
        );
        assert!(ctx.notifier.sent_to(ctx.deliverer).is_empty());
        assert_eq!(ctx.notifier.sent_to(ctx.admin).len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn members_cannot_create_orders() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;

        let result = ctx
            .orders
            .create_order(ctx.member, NewOrder::for_restaurant(menu.restaurant))
            .await;

        assert!(
            matches!(result, Err(OrdersServiceError::Forbidden)),
            "expected Forbidden, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_attaches_sum_exactly() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;

        let order = ctx
            .orders
            .create_order(ctx.deliverer, NewOrder::for_restaurant(menu.restaurant))
            .await?;

        let first = filled_cart(&ctx, ctx.member, menu.restaurant, &[(menu.pizza, 3)]).await?;
        let second = filled_cart(&ctx, ctx.admin, menu.restaurant, &[(menu.soda, 4)]).await?;
        let third = filled_cart(&ctx, ctx.super_admin, menu.restaurant, &[(menu.pizza, 1)]).await?;

        let (a, b, c) = tokio::join!(
            ctx.orders.attach_cart(ctx.member, first.uuid, order.uuid),
            ctx.orders.attach_cart(ctx.admin, second.uuid, order.uuid),
            ctx.orders.attach_cart(ctx.super_admin, third.uuid, order.uuid),
        );

        a?;
        b?;
        c?;

        let order = ctx.orders.get_order(ctx.deliverer, order.uuid).await?;

        assert_eq!(order.total_amount, Decimal::new(300 + 200 + 100, 0));

        Ok(())
    }

    #[tokio::test]
    async fn empty_and_cancelled_carts_cannot_be_attached() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;

        let order = ctx
            .orders
            .create_order(ctx.deliverer, NewOrder::for_restaurant(menu.restaurant))
            .await?;

        let empty = ctx
            .carts
            .get_or_create_active_cart(ctx.member, menu.restaurant)
            .await?;

        let result = ctx.orders.attach_cart(ctx.member, empty.uuid, order.uuid).await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::CartNotAttachable { item_count: 0, .. })
            ),
            "expected CartNotAttachable, got {result:?}"
        );

        let filled = filled_cart(&ctx, ctx.member, menu.restaurant, &[(menu.pizza, 1)]).await?;

        ctx.carts.cancel_cart(ctx.member, filled.uuid).await?;

        let result = ctx
            .orders
            .attach_cart(ctx.member, filled.uuid, order.uuid)
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::CartNotAttachable {
                    status: CartStatus::Cancelled,
                    ..
                })
            ),
            "expected CartNotAttachable, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn attached_carts_are_frozen_and_cannot_join_twice() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;

        let order = ctx
            .orders
            .create_order(ctx.deliverer, NewOrder::for_restaurant(menu.restaurant))
            .await?;
        let cart = filled_cart(&ctx, ctx.member, menu.restaurant, &[(menu.pizza, 1)]).await?;

        ctx.orders.attach_cart(ctx.member, cart.uuid, order.uuid).await?;

        let edit = ctx
            .carts
            .set_amount(ctx.member, cart.uuid, menu.pizza, 5)
            .await;

        assert!(
            matches!(
                edit,
                Err(crate::domain::carts::CartsServiceError::NotEditable {
                    status: CartStatus::Ordered
                })
            ),
            "expected NotEditable, got {edit:?}"
        );

        let again = ctx.orders.attach_cart(ctx.member, cart.uuid, order.uuid).await;

        assert!(
            matches!(again, Err(OrdersServiceError::CartNotAttachable { .. })),
            "expected CartNotAttachable, got {again:?}"
        );

        assert!(ctx.carts.get_current_cart(ctx.member).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn carts_from_another_restaurant_are_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;
        let other = ctx.create_restaurant("Noodle Bar").await?;

        let order = ctx
            .orders
            .create_order(ctx.deliverer, NewOrder::for_restaurant(other.uuid))
            .await?;
        let cart = filled_cart(&ctx, ctx.member, menu.restaurant, &[(menu.pizza, 1)]).await?;

        let result = ctx.orders.attach_cart(ctx.member, cart.uuid, order.uuid).await;

        assert!(
            matches!(result, Err(OrdersServiceError::RestaurantMismatch)),
            "expected RestaurantMismatch, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn invalid_transitions_are_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;

        let order = ctx
            .orders
            .create_order(ctx.deliverer, NewOrder::for_restaurant(menu.restaurant))
            .await?;

        let skip = ctx
            .orders
            .set_status(ctx.deliverer, order.uuid, OrderStatus::Delivered)
            .await;

        assert!(
            matches!(
                skip,
                Err(OrdersServiceError::InvalidTransition(InvalidTransition {
                    from: OrderStatus::Collecting,
                    to: OrderStatus::Delivered,
                }))
            ),
            "expected InvalidTransition, got {skip:?}"
        );

        ctx.orders
            .set_status(ctx.deliverer, order.uuid, OrderStatus::Collected)
            .await?;

        let back = ctx
            .orders
            .set_status(ctx.deliverer, order.uuid, OrderStatus::Collecting)
            .await;

        assert!(
            matches!(back, Err(OrdersServiceError::InvalidTransition(_))),
            "expected InvalidTransition, got {back:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn collected_order_sends_summary_to_deliverer() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;

        let order = ctx
            .orders
            .create_order(ctx.deliverer, NewOrder::for_restaurant(menu.restaurant))
            .await?;

        for user in [ctx.member, ctx.admin] {
            let cart = filled_cart(&ctx, user, menu.restaurant, &[(menu.pizza, 1)]).await?;

            ctx.orders.attach_cart(user, cart.uuid, order.uuid).await?;
        }

        ctx.notifier.clear();

        ctx.orders
            .set_status(ctx.deliverer, order.uuid, OrderStatus::Collected)
            .await?;

        let sent = ctx.notifier.sent_to(ctx.deliverer);

        let [Notification::OrderCollected { summary, total_amount, .. }] = sent.as_slice() else {
            panic!("expected one collected notice, got {sent:?}");
        };

        assert_eq!(*total_amount, Decimal::new(200, 0));
        assert_eq!(
            summary.dish(menu.pizza.into_uuid()).map(|dish| dish.total_amount),
            Some(2)
        );
        assert!(ctx.notifier.sent_to(ctx.member).is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn summary_merges_lines_with_different_prices() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;

        ctx.catalog
            .set_dish_price(ctx.admin, menu.pizza, Decimal::new(1000, 2))
            .await?;

        let order = ctx
            .orders
            .create_order(ctx.deliverer, NewOrder::for_restaurant(menu.restaurant))
            .await?;
        let first = filled_cart(&ctx, ctx.member, menu.restaurant, &[(menu.pizza, 2)]).await?;

        ctx.catalog
            .set_dish_price(ctx.admin, menu.pizza, Decimal::new(1200, 2))
            .await?;

        let second = filled_cart(&ctx, ctx.admin, menu.restaurant, &[(menu.pizza, 3)]).await?;

        ctx.orders.attach_cart(ctx.member, first.uuid, order.uuid).await?;
        ctx.orders.attach_cart(ctx.admin, second.uuid, order.uuid).await?;

        let summary = ctx
            .orders
            .build_consolidated_summary(ctx.deliverer, order.uuid)
            .await?;

        let pizza = summary.dish(menu.pizza.into_uuid());

        assert_eq!(pizza.map(|dish| dish.total_amount), Some(5));
        assert_eq!(pizza.map(|dish| dish.total_price), Some(Decimal::new(5600, 2)));
        assert_eq!(summary.total_price, Decimal::new(5600, 2));

        Ok(())
    }

    #[tokio::test]
    async fn deleted_dishes_land_in_uncategorised_bucket() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;

        let order = ctx
            .orders
            .create_order(ctx.deliverer, NewOrder::for_restaurant(menu.restaurant))
            .await?;
        let cart = filled_cart(
            &ctx,
            ctx.member,
            menu.restaurant,
            &[(menu.pizza, 1), (menu.soda, 2)],
        )
        .await?;

        ctx.orders.attach_cart(ctx.member, cart.uuid, order.uuid).await?;
        ctx.catalog.delete_dish(ctx.admin, menu.soda).await?;

        let summary = ctx
            .orders
            .build_consolidated_summary(ctx.deliverer, order.uuid)
            .await?;

        let last = summary.categories.last();

        assert_eq!(summary.categories.len(), 2);
        assert!(last.is_some_and(|bucket| bucket.category.is_none()));
        assert_eq!(
            last.and_then(|bucket| bucket.dishes.first())
                .map(|dish| dish.name.as_str()),
            Some("Soda")
        );
        assert_eq!(summary.total_price, Decimal::new(200, 0));

        Ok(())
    }

    #[tokio::test]
    async fn cancelling_releases_carts() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;

        let order = ctx
            .orders
            .create_order(ctx.deliverer, NewOrder::for_restaurant(menu.restaurant))
            .await?;
        let cart = filled_cart(&ctx, ctx.member, menu.restaurant, &[(menu.pizza, 1)]).await?;

        ctx.orders.attach_cart(ctx.member, cart.uuid, order.uuid).await?;

        let cancelled = ctx
            .orders
            .set_status(ctx.deliverer, order.uuid, OrderStatus::Cancelled)
            .await?;

        assert_eq!(cancelled.total_amount, Decimal::ZERO);
        assert!(cancelled.cancelled_at.is_some());

        let cart = ctx.carts.get_cart(ctx.member, cart.uuid).await?;

        assert_eq!(cart.status, CartStatus::Active);
        assert_eq!(cart.delivery_order, None);

        Ok(())
    }

    #[tokio::test]
    async fn detach_returns_cart_and_reduces_total() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;

        let order = ctx
            .orders
            .create_order(ctx.deliverer, NewOrder::for_restaurant(menu.restaurant))
            .await?;
        let first = filled_cart(&ctx, ctx.member, menu.restaurant, &[(menu.pizza, 1)]).await?;
        let second = filled_cart(&ctx, ctx.admin, menu.restaurant, &[(menu.soda, 1)]).await?;

        ctx.orders.attach_cart(ctx.member, first.uuid, order.uuid).await?;
        ctx.orders.attach_cart(ctx.admin, second.uuid, order.uuid).await?;

        let updated = ctx.orders.detach_cart(ctx.member, first.uuid).await?;

        assert_eq!(updated.total_amount, Decimal::new(50, 0));

        let cart = ctx.carts.get_cart(ctx.member, first.uuid).await?;

        assert_eq!(cart.status, CartStatus::Active);

        let by_deliverer = ctx.orders.detach_cart(ctx.deliverer, second.uuid).await?;

        assert_eq!(by_deliverer.total_amount, Decimal::ZERO);

        let not_attached = ctx.orders.detach_cart(ctx.member, first.uuid).await;

        assert!(
            matches!(not_attached, Err(OrdersServiceError::CartNotInOrder)),
            "expected CartNotInOrder, got {not_attached:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn delete_order_only_while_collecting() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;

        let open = ctx
            .orders
            .create_order(ctx.deliverer, NewOrder::for_restaurant(menu.restaurant))
            .await?;
        let cart = filled_cart(&ctx, ctx.member, menu.restaurant, &[(menu.pizza, 1)]).await?;

        ctx.orders.attach_cart(ctx.member, cart.uuid, open.uuid).await?;
        ctx.orders.delete_order(ctx.deliverer, open.uuid).await?;

        let cart = ctx.carts.get_cart(ctx.member, cart.uuid).await?;

        assert_eq!(cart.status, CartStatus::Active);
        assert!(cart.is_attachable());

        let gone = ctx.orders.get_order(ctx.deliverer, open.uuid).await;

        assert!(
            matches!(gone, Err(OrdersServiceError::NotFound)),
            "expected NotFound, got {gone:?}"
        );

        let collected = ctx
            .orders
            .create_order(ctx.deliverer, NewOrder::for_restaurant(menu.restaurant))
            .await?;

        ctx.orders
            .set_status(ctx.deliverer, collected.uuid, OrderStatus::Collected)
            .await?;

        let result = ctx.orders.delete_order(ctx.deliverer, collected.uuid).await;

        assert!(
            matches!(result, Err(OrdersServiceError::InvalidTransition(_))),
            "expected InvalidTransition, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn deliverers_manage_only_their_own_orders() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;
        let other = ctx.register(7_001).await?;

        ctx.users
            .assign_role(ctx.admin, other, Role::Delivery)
            .await?;

        let order = ctx
            .orders
            .create_order(ctx.deliverer, NewOrder::for_restaurant(menu.restaurant))
            .await?;

        let foreign = ctx
            .orders
            .set_status(other, order.uuid, OrderStatus::Collected)
            .await;

        assert!(
            matches!(foreign, Err(OrdersServiceError::Forbidden)),
            "expected Forbidden, got {foreign:?}"
        );

        let handed_over = ctx
            .orders
            .assign_delivery_person(ctx.admin, order.uuid, other)
            .await?;

        assert_eq!(handed_over.delivery_person, other);

        ctx.orders
            .set_status(other, order.uuid, OrderStatus::Collected)
            .await?;

        let mine = ctx.orders.list_my_orders(other, 10).await?;

        assert_eq!(mine.iter().map(|o| o.uuid).collect::<Vec<_>>(), vec![order.uuid]);

        Ok(())
    }

    #[tokio::test]
    async fn members_cannot_be_made_deliverers_of_an_order() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;

        let order = ctx
            .orders
            .create_order(ctx.deliverer, NewOrder::for_restaurant(menu.restaurant))
            .await?;

        let result = ctx
            .orders
            .assign_delivery_person(ctx.deliverer, order.uuid, ctx.member)
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::NotOrderManager { role: Role::Member })
            ),
            "expected NotOrderManager, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn list_order_carts_names_owners() -> TestResult {
        let ctx = TestContext::new().await;
        let menu = ctx.menu().await?;

        let order = ctx
            .orders
            .create_order(ctx.deliverer, NewOrder::for_restaurant(menu.restaurant))
            .await?;
        let cart = filled_cart(&ctx, ctx.member, menu.restaurant, &[(menu.pizza, 2)]).await?;

        ctx.orders.attach_cart(ctx.member, cart.uuid, order.uuid).await?;

        let collecting = ctx
            .orders
            .list_collecting_orders(ctx.member, menu.restaurant)
            .await?;

        assert_eq!(collecting.len(), 1);

        let breakdown = ctx.orders.list_order_carts(ctx.deliverer, order.uuid).await?;

        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown.first().map(|entry| entry.owner.uuid), Some(ctx.member));
        assert_eq!(
            breakdown.first().map(|entry| entry.cart.items.len()),
            Some(1)
        );

        Ok(())
    }
}
