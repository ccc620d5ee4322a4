//! Catalog service.

use async_trait::async_trait;
use mockall::automock;
use platter::{
    import::ImportLine,
    roles::CATALOG_MANAGERS,
    validation::{validate_name, validate_price},
};
use rust_decimal::Decimal;
use sqlx::{Connection, Postgres, Transaction};
use tracing::{Span, debug, info};

use crate::{
    database::Db,
    domain::{
        access::require_role,
        catalog::{
            data::{
                DishImportError, DishImportFailure, DishImportReport, NewCategory, NewDish,
                NewRestaurant, Visibility,
            },
            errors::CatalogServiceError,
            records::{
                CategoryRecord, CategoryUuid, DishRecord, DishUuid, RestaurantRecord,
                RestaurantUuid,
            },
            repositories::{PgCategoriesRepository, PgDishesRepository, PgRestaurantsRepository},
        },
        users::{records::UserUuid, repository::PgUsersRepository},
    },
};

#[derive(Debug, Clone)]
pub struct PgCatalogService {
    db: Db,
    restaurants: PgRestaurantsRepository,
    categories: PgCategoriesRepository,
    dishes: PgDishesRepository,
    users: PgUsersRepository,
}

impl PgCatalogService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            restaurants: PgRestaurantsRepository::new(),
            categories: PgCategoriesRepository::new(),
            dishes: PgDishesRepository::new(),
            users: PgUsersRepository::new(),
        }
    }

    async fn begin_mutation(
        &self,
        caller: UserUuid,
    ) -> Result<Transaction<'static, Postgres>, CatalogServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        require_role(&self.users, &mut tx, caller, CATALOG_MANAGERS).await?;

        Ok(tx)
    }

    async fn list_restaurants(
        &self,
        visibility: Visibility,
    ) -> Result<Vec<RestaurantRecord>, CatalogServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let restaurants = self
            .restaurants
            .list_restaurants(&mut tx, visibility.as_filter())
            .await?;

        tx.commit().await?;

        Ok(restaurants)
    }
}

#[async_trait]
impl CatalogService for PgCatalogService {
    async fn list_active_restaurants(&self) -> Result<Vec<RestaurantRecord>, CatalogServiceError> {
        self.list_restaurants(Visibility::Active).await
    }

    async fn list_inactive_restaurants(
        &self,
    ) -> Result<Vec<RestaurantRecord>, CatalogServiceError> {
        self.list_restaurants(Visibility::Inactive).await
    }

    async fn get_restaurant(
        &self,
        restaurant: RestaurantUuid,
    ) -> Result<RestaurantRecord, CatalogServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let restaurant = self.restaurants.get_restaurant(&mut tx, restaurant).await?;

        tx.commit().await?;

        Ok(restaurant)
    }

    #[tracing::instrument(
        name = "catalog.service.create_restaurant",
        skip(self, restaurant),
        fields(caller = %caller, restaurant = %restaurant.uuid),
        err
    )]
    async fn create_restaurant(
        &self,
        caller: UserUuid,
        restaurant: NewRestaurant,
    ) -> Result<RestaurantRecord, CatalogServiceError> {
        let name = validate_name(&restaurant.name)?;

        let mut tx = self.begin_mutation(caller).await?;

        let created = self
            .restaurants
            .create_restaurant(&mut tx, restaurant.uuid, &name)
            .await?;

        tx.commit().await?;

        info!(name = %created.name, "restaurant created");

        Ok(created)
    }

    async fn rename_restaurant(
        &self,
        caller: UserUuid,
        restaurant: RestaurantUuid,
        name: String,
    ) -> Result<RestaurantRecord, CatalogServiceError> {
        let name = validate_name(&name)?;

        let mut tx = self.begin_mutation(caller).await?;

        let renamed = self
            .restaurants
            .rename_restaurant(&mut tx, restaurant, &name)
            .await?;

        tx.commit().await?;

        Ok(renamed)
    }

    async fn set_restaurant_active(
        &self,
        caller: UserUuid,
        restaurant: RestaurantUuid,
        is_active: bool,
    ) -> Result<RestaurantRecord, CatalogServiceError> {
        let mut tx = self.begin_mutation(caller).await?;

        let updated = self
            .restaurants
            .set_restaurant_active(&mut tx, restaurant, is_active)
            .await?;

        tx.commit().await?;

        info!(restaurant = %restaurant, is_active, "restaurant visibility changed");

        Ok(updated)
    }

    async fn create_category(
        &self,
        caller: UserUuid,
        category: NewCategory,
    ) -> Result<CategoryRecord, CatalogServiceError> {
        let name = validate_name(&category.name)?;

        let mut tx = self.begin_mutation(caller).await?;

        let created = self
            .categories
            .create_category(&mut tx, category.uuid, category.restaurant, &name)
            .await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn get_category(
        &self,
        category: CategoryUuid,
    ) -> Result<CategoryRecord, CatalogServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let category = self.categories.get_category(&mut tx, category).await?;

        tx.commit().await?;

        Ok(category)
    }

    async fn list_categories(
        &self,
        restaurant: RestaurantUuid,
        visibility: Visibility,
    ) -> Result<Vec<CategoryRecord>, CatalogServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let categories = self
            .categories
            .list_categories(&mut tx, restaurant, visibility.as_filter())
            .await?;

        tx.commit().await?;

        Ok(categories)
    }

    async fn rename_category(
        &self,
        caller: UserUuid,
        category: CategoryUuid,
        name: String,
    ) -> Result<CategoryRecord, CatalogServiceError> {
        let name = validate_name(&name)?;

        let mut tx = self.begin_mutation(caller).await?;

        let renamed = self
            .categories
            .rename_category(&mut tx, category, &name)
            .await?;

        tx.commit().await?;

        Ok(renamed)
    }

    async fn set_category_active(
        &self,
        caller: UserUuid,
        category: CategoryUuid,
        is_active: bool,
    ) -> Result<CategoryRecord, CatalogServiceError> {
        let mut tx = self.begin_mutation(caller).await?;

        let updated = self
            .categories
            .set_category_active(&mut tx, category, is_active)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    async fn set_category_display_order(
        &self,
        caller: UserUuid,
        category: CategoryUuid,
        display_order: i32,
    ) -> Result<CategoryRecord, CatalogServiceError> {
        let mut tx = self.begin_mutation(caller).await?;

        let updated = self
            .categories
            .set_category_display_order(&mut tx, category, display_order)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    #[tracing::instrument(
        name = "catalog.service.create_dish",
        skip(self, dish),
        fields(caller = %caller, dish = %dish.uuid, category = %dish.category),
        err
    )]
    async fn create_dish(
        &self,
        caller: UserUuid,
        dish: NewDish,
    ) -> Result<DishRecord, CatalogServiceError> {
        let name = validate_name(&dish.name)?;
        let price = validate_price(dish.price)?;

        let mut tx = self.begin_mutation(caller).await?;

        let created = self
            .dishes
            .create_dish(&mut tx, dish.uuid, dish.category, &name, price)
            .await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn get_dish(&self, dish: DishUuid) -> Result<DishRecord, CatalogServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let dish = self.dishes.get_dish(&mut tx, dish).await?;

        tx.commit().await?;

        Ok(dish)
    }

    async fn list_dishes(
        &self,
        category: CategoryUuid,
        visibility: Visibility,
    ) -> Result<Vec<DishRecord>, CatalogServiceError> {
        let mut tx = self.db.begin_transaction().await?;

        let dishes = self
            .dishes
            .list_dishes(&mut tx, category, visibility.as_filter())
            .await?;

        tx.commit().await?;

        Ok(dishes)
    }

    async fn rename_dish(
        &self,
        caller: UserUuid,
        dish: DishUuid,
        name: String,
    ) -> Result<DishRecord, CatalogServiceError> {
        let name = validate_name(&name)?;

        let mut tx = self.begin_mutation(caller).await?;

        let renamed = self.dishes.rename_dish(&mut tx, dish, &name).await?;

        tx.commit().await?;

        Ok(renamed)
    }

    #[tracing::instrument(
        name = "catalog.service.set_dish_price",
        skip(self),
        fields(caller = %caller, dish = %dish, price = %price),
        err
    )]
    async fn set_dish_price(
        &self,
        caller: UserUuid,
        dish: DishUuid,
        price: Decimal,
    ) -> Result<DishRecord, CatalogServiceError> {
        let price = validate_price(price)?;

        let mut tx = self.begin_mutation(caller).await?;

        let updated = self.dishes.set_dish_price(&mut tx, dish, price).await?;

        tx.commit().await?;

        Ok(updated)
    }

    async fn set_dish_active(
        &self,
        caller: UserUuid,
        dish: DishUuid,
        is_active: bool,
    ) -> Result<DishRecord, CatalogServiceError> {
        let mut tx = self.begin_mutation(caller).await?;

        let updated = self.dishes.set_dish_active(&mut tx, dish, is_active).await?;

        tx.commit().await?;

        Ok(updated)
    }

    async fn set_dish_display_order(
        &self,
        caller: UserUuid,
        dish: DishUuid,
        display_order: i32,
    ) -> Result<DishRecord, CatalogServiceError> {
        let mut tx = self.begin_mutation(caller).await?;

        let updated = self
            .dishes
            .set_dish_display_order(&mut tx, dish, display_order)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    #[tracing::instrument(
        name = "catalog.service.delete_dish",
        skip(self),
        fields(caller = %caller, dish = %dish),
        err
    )]
    async fn delete_dish(&self, caller: UserUuid, dish: DishUuid) -> Result<(), CatalogServiceError> {
        let mut tx = self.begin_mutation(caller).await?;

        let rows_affected = self.dishes.delete_dish(&mut tx, dish).await?;

        if rows_affected == 0 {
            return Err(CatalogServiceError::NotFound);
        }

        tx.commit().await?;

        info!("dish deleted");

        Ok(())
    }

    #[tracing::instrument(
        name = "catalog.service.import_dishes",
        skip(self, lines),
        fields(
            caller = %caller,
            category = %category,
            line_count = lines.len(),
            created_count = tracing::field::Empty,
            failed_count = tracing::field::Empty
        ),
        err
    )]
    async fn import_dishes(
        &self,
        caller: UserUuid,
        category: CategoryUuid,
        lines: Vec<ImportLine>,
    ) -> Result<DishImportReport, CatalogServiceError> {
        let mut tx = self.begin_mutation(caller).await?;

        self.categories.get_category(&mut tx, category).await?;

        let mut report = DishImportReport::default();

        for line in lines {
            let (name, price) = match line.validate() {
                Ok(valid) => valid,
                Err(error) => {
                    debug!(line = line.line, error = %error, "skipping invalid import line");

                    report.failed.push(DishImportFailure {
                        line: line.line,
                        name: line.name,
                        reason: DishImportError::Invalid(error),
                    });

                    continue;
                }
            };

            let mut savepoint = Connection::begin(&mut *tx).await?;

            match self
                .dishes
                .create_dish(&mut savepoint, DishUuid::new(), category, &name, price)
                .await
            {
                Ok(dish) => {
                    savepoint.commit().await?;
                    report.created.push(dish);
                }
                Err(error) => {
                    savepoint.rollback().await?;

                    debug!(line = line.line, error = %error, "import line rejected");

                    report.failed.push(DishImportFailure {
                        line: line.line,
                        name,
                        reason: DishImportError::Rejected(error),
                    });
                }
            }
        }

        tx.commit().await?;

        Span::current().record("created_count", report.created.len());
        Span::current().record("failed_count", report.failed.len());

        info!(
            created = report.created.len(),
            failed = report.failed.len(),
            "dishes imported"
        );

        Ok(report)
    }
}

#[automock]
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Active restaurants, by name.
    async fn list_active_restaurants(&self) -> Result<Vec<RestaurantRecord>, CatalogServiceError>;

    /// Deactivated restaurants, by name.
    async fn list_inactive_restaurants(&self)
    -> Result<Vec<RestaurantRecord>, CatalogServiceError>;

    /// Retrieve a single restaurant.
    async fn get_restaurant(
        &self,
        restaurant: RestaurantUuid,
    ) -> Result<RestaurantRecord, CatalogServiceError>;

    /// Create a restaurant. Names are unique.
    async fn create_restaurant(
        &self,
        caller: UserUuid,
        restaurant: NewRestaurant,
    ) -> Result<RestaurantRecord, CatalogServiceError>;

    async fn rename_restaurant(
        &self,
        caller: UserUuid,
        restaurant: RestaurantUuid,
        name: String,
    ) -> Result<RestaurantRecord, CatalogServiceError>;

    /// Show or hide a restaurant. Its categories and dishes keep their own flags.
    async fn set_restaurant_active(
        &self,
        caller: UserUuid,
        restaurant: RestaurantUuid,
        is_active: bool,
    ) -> Result<RestaurantRecord, CatalogServiceError>;

    /// Create a category after the restaurant's existing ones.
    async fn create_category(
        &self,
        caller: UserUuid,
        category: NewCategory,
    ) -> Result<CategoryRecord, CatalogServiceError>;

    async fn get_category(
        &self,
        category: CategoryUuid,
    ) -> Result<CategoryRecord, CatalogServiceError>;

    /// Categories by display order, then creation.
    async fn list_categories(
        &self,
        restaurant: RestaurantUuid,
        visibility: Visibility,
    ) -> Result<Vec<CategoryRecord>, CatalogServiceError>;

    async fn rename_category(
        &self,
        caller: UserUuid,
        category: CategoryUuid,
        name: String,
    ) -> Result<CategoryRecord, CatalogServiceError>;

    async fn set_category_active(
        &self,
        caller: UserUuid,
        category: CategoryUuid,
        is_active: bool,
    ) -> Result<CategoryRecord, CatalogServiceError>;

    async fn set_category_display_order(
        &self,
        caller: UserUuid,
        category: CategoryUuid,
        display_order: i32,
    ) -> Result<CategoryRecord, CatalogServiceError>;

    /// Create a dish. The price must be positive with at most two decimal places.
    async fn create_dish(
        &self,
        caller: UserUuid,
        dish: NewDish,
    ) -> Result<DishRecord, CatalogServiceError>;

    async fn get_dish(&self, dish: DishUuid) -> Result<DishRecord, CatalogServiceError>;

    /// Dishes by display order, then creation.
    async fn list_dishes(
        &self,
        category: CategoryUuid,
        visibility: Visibility,
    ) -> Result<Vec<DishRecord>, CatalogServiceError>;

    async fn rename_dish(
        &self,
        caller: UserUuid,
        dish: DishUuid,
        name: String,
    ) -> Result<DishRecord, CatalogServiceError>;

    /// Change the menu price. Existing cart lines keep the price they were added at.
    async fn set_dish_price(
        &self,
        caller: UserUuid,
        dish: DishUuid,
        price: Decimal,
    ) -> Result<DishRecord, CatalogServiceError>;

    async fn set_dish_active(
        &self,
        caller: UserUuid,
        dish: DishUuid,
        is_active: bool,
    ) -> Result<DishRecord, CatalogServiceError>;

    async fn set_dish_display_order(
        &self,
        caller: UserUuid,
        dish: DishUuid,
        display_order: i32,
    ) -> Result<DishRecord, CatalogServiceError>;

    /// Permanently remove a dish. Cart lines that reference it keep their snapshot.
    async fn delete_dish(&self, caller: UserUuid, dish: DishUuid) -> Result<(), CatalogServiceError>;

    /// Create many dishes in one category, skipping entries that fail.
    async fn import_dishes(
        &self,
        caller: UserUuid,
        category: CategoryUuid,
        lines: Vec<ImportLine>,
    ) -> Result<DishImportReport, CatalogServiceError>;
}

#[cfg(test)]
mod tests {
    use platter::import::parse_import_lines;
    use testresult::TestResult;

    use crate::test::TestContext;

    use super::*;

    #[tokio::test]
    async fn create_restaurant_trims_name() -> TestResult {
        let ctx = TestContext::new().await;
        let uuid = RestaurantUuid::new();

        let restaurant = ctx
            .catalog
            .create_restaurant(
                ctx.admin,
                NewRestaurant {
                    uuid,
                    name: "  Pizza Place ".to_owned(),
                },
            )
            .await?;

        assert_eq!(restaurant.uuid, uuid);
        assert_eq!(restaurant.name, "Pizza Place");
        assert!(restaurant.is_active);

        Ok(())
    }

    #[tokio::test]
    async fn create_restaurant_duplicate_name_returns_already_exists() -> TestResult {
        let ctx = TestContext::new().await;

        ctx.create_restaurant("Pizza Place").await?;

        let result = ctx.create_restaurant("Pizza Place").await;

        assert!(
            matches!(result, Err(CatalogServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn members_cannot_mutate_catalog() {
        let ctx = TestContext::new().await;

        let result = ctx
            .catalog
            .create_restaurant(
                ctx.member,
                NewRestaurant {
                    uuid: RestaurantUuid::new(),
                    name: "Sneaky".to_owned(),
                },
            )
            .await;

        assert!(
            matches!(result, Err(CatalogServiceError::Forbidden)),
            "expected Forbidden, got {result:?}"
        );
    }

    #[tokio::test]
    async fn deactivated_restaurants_move_to_inactive_listing() -> TestResult {
        let ctx = TestContext::new().await;

        let sushi = ctx.create_restaurant("Sushi Bar").await?;
        ctx.create_restaurant("Burger Joint").await?;
        let category = ctx.create_category(sushi.uuid, "Rolls").await?;

        ctx.catalog
            .set_restaurant_active(ctx.admin, sushi.uuid, false)
            .await?;

        let active = ctx.catalog.list_active_restaurants().await?;
        let inactive = ctx.catalog.list_inactive_restaurants().await?;

        assert_eq!(
            active.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            vec!["Burger Joint"]
        );
        assert_eq!(
            inactive.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            vec!["Sushi Bar"]
        );
        assert!(
            ctx.catalog.get_category(category.uuid).await?.is_active,
            "categories keep their own flag"
        );

        Ok(())
    }

    #[tokio::test]
    async fn categories_list_in_display_order() -> TestResult {
        let ctx = TestContext::new().await;
        let restaurant = ctx.create_restaurant("Diner").await?;

        let mains = ctx.create_category(restaurant.uuid, "Mains").await?;
        let drinks = ctx.create_category(restaurant.uuid, "Drinks").await?;
        let desserts = ctx.create_category(restaurant.uuid, "Desserts").await?;

        assert_eq!((mains.display_order, drinks.display_order), (0, 1));

        ctx.catalog
            .set_category_display_order(ctx.admin, desserts.uuid, -1)
            .await?;
        ctx.catalog
            .set_category_active(ctx.admin, drinks.uuid, false)
            .await?;

        let active = ctx
            .catalog
            .list_categories(restaurant.uuid, Visibility::Active)
            .await?;
        let all = ctx
            .catalog
            .list_categories(restaurant.uuid, Visibility::All)
            .await?;

        assert_eq!(
            active.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["Desserts", "Mains"]
        );
        assert_eq!(all.len(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn create_category_for_unknown_restaurant_returns_invalid_reference() {
        let ctx = TestContext::new().await;

        let result = ctx.create_category(RestaurantUuid::new(), "Ghost").await;

        assert!(
            matches!(result, Err(CatalogServiceError::InvalidReference)),
            "expected InvalidReference, got {result:?}"
        );
    }

    #[tokio::test]
    async fn create_dish_rejects_non_positive_price() -> TestResult {
        let ctx = TestContext::new().await;
        let restaurant = ctx.create_restaurant("Diner").await?;
        let category = ctx.create_category(restaurant.uuid, "Mains").await?;

        let result = ctx.create_dish(category.uuid, "Free lunch", 0).await;

        assert!(
            matches!(result, Err(CatalogServiceError::Invalid(_))),
            "expected Invalid, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn set_dish_price_changes_menu_price() -> TestResult {
        let ctx = TestContext::new().await;
        let restaurant = ctx.create_restaurant("Diner").await?;
        let category = ctx.create_category(restaurant.uuid, "Mains").await?;
        let dish = ctx.create_dish(category.uuid, "Burger", 1000).await?;

        let updated = ctx
            .catalog
            .set_dish_price(ctx.admin, dish.uuid, Decimal::new(1250, 2))
            .await?;

        assert_eq!(updated.price, Decimal::new(1250, 2));

        Ok(())
    }

    #[tokio::test]
    async fn delete_dish_makes_it_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let restaurant = ctx.create_restaurant("Diner").await?;
        let category = ctx.create_category(restaurant.uuid, "Mains").await?;
        let dish = ctx.create_dish(category.uuid, "Burger", 1000).await?;

        ctx.catalog.delete_dish(ctx.admin, dish.uuid).await?;

        let result = ctx.catalog.get_dish(dish.uuid).await;

        assert!(
            matches!(result, Err(CatalogServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        let again = ctx.catalog.delete_dish(ctx.admin, dish.uuid).await;

        assert!(
            matches!(again, Err(CatalogServiceError::NotFound)),
            "expected NotFound, got {again:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn import_dishes_keeps_good_lines_and_reports_bad_ones() -> TestResult {
        let ctx = TestContext::new().await;
        let restaurant = ctx.create_restaurant("Diner").await?;
        let category = ctx.create_category(restaurant.uuid, "Mains").await?;

        let lines = parse_import_lines("Burger | 450\nSoup | free\n\nPasta | 390,50\nWater");

        let report = ctx
            .catalog
            .import_dishes(ctx.admin, category.uuid, lines)
            .await?;

        assert_eq!(report.total(), 4);
        assert_eq!(
            report.created.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
            vec!["Burger", "Pasta"]
        );
        assert_eq!(
            report.failed.iter().map(|f| f.line).collect::<Vec<_>>(),
            vec![2, 5]
        );

        let dishes = ctx
            .catalog
            .list_dishes(category.uuid, Visibility::All)
            .await?;

        assert_eq!(dishes.len(), 2);
        assert_eq!(
            dishes.get(1).map(|dish| dish.price),
            Some(Decimal::new(39_050, 2))
        );

        Ok(())
    }

    #[tokio::test]
    async fn import_dishes_into_unknown_category_fails() {
        let ctx = TestContext::new().await;

        let result = ctx
            .catalog
            .import_dishes(ctx.admin, CategoryUuid::new(), parse_import_lines("Tea | 90"))
            .await;

        assert!(
            matches!(result, Err(CatalogServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }
}
