//! Test Helpers

use rust_decimal::Decimal;

use crate::{
    domain::catalog::{
        CatalogService, CatalogServiceError,
        data::{NewCategory, NewDish, NewRestaurant},
        records::{CategoryRecord, CategoryUuid, DishRecord, DishUuid, RestaurantRecord, RestaurantUuid},
    },
    test::TestContext,
};

/// A small seeded menu: a 100.00 pizza and a 50.00 soda.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Menu {
    pub(crate) restaurant: RestaurantUuid,
    pub(crate) pizza: DishUuid,
    pub(crate) soda: DishUuid,
}

impl TestContext {
    pub(crate) async fn create_restaurant(
        &self,
        name: &str,
    ) -> Result<RestaurantRecord, CatalogServiceError> {
        self.catalog
            .create_restaurant(
                self.admin,
                NewRestaurant {
                    uuid: RestaurantUuid::new(),
                    name: name.to_owned(),
                },
            )
            .await
    }

    pub(crate) async fn create_category(
        &self,
        restaurant: RestaurantUuid,
        name: &str,
    ) -> Result<CategoryRecord, CatalogServiceError> {
        self.catalog
            .create_category(
                self.admin,
                NewCategory {
                    uuid: CategoryUuid::new(),
                    restaurant,
                    name: name.to_owned(),
                },
            )
            .await
    }

    /// Create a dish priced in minor units.
    pub(crate) async fn create_dish(
        &self,
        category: CategoryUuid,
        name: &str,
        price_minor: i64,
    ) -> Result<DishRecord, CatalogServiceError> {
        self.catalog
            .create_dish(
                self.admin,
                NewDish {
                    uuid: DishUuid::new(),
                    category,
                    name: name.to_owned(),
                    price: Decimal::new(price_minor, 2),
                },
            )
            .await
    }

    pub(crate) async fn menu(&self) -> Result<Menu, CatalogServiceError> {
        let restaurant = self.create_restaurant("Trattoria").await?;
        let category = self.create_category(restaurant.uuid, "Mains").await?;
        let pizza = self.create_dish(category.uuid, "Pizza", 10_000).await?;
        let soda = self.create_dish(category.uuid, "Soda", 5_000).await?;

        Ok(Menu {
            restaurant: restaurant.uuid,
            pizza: pizza.uuid,
            soda: soda.uuid,
        })
    }
}
