//! Catalog Repositories

mod categories;
mod dishes;
mod restaurants;

pub(crate) use categories::PgCategoriesRepository;
pub(crate) use dishes::PgDishesRepository;
pub(crate) use restaurants::PgRestaurantsRepository;
