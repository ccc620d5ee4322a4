//! Platter Domain Concerns

pub(crate) mod access;
pub mod carts;
pub mod catalog;
pub mod orders;
pub mod users;
