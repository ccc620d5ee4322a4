//! Cart Repositories

mod carts;
mod items;
mod menu;

pub(crate) use carts::PgCartsRepository;
pub(crate) use items::PgCartItemsRepository;
pub(crate) use menu::{MenuDish, PgMenuRepository};
