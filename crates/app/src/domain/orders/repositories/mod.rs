//! Delivery Order Repositories

mod members;
mod orders;

pub(crate) use members::PgOrderCartsRepository;
pub(crate) use orders::{OrderRow, PgOrdersRepository};
