//! Platter
//!
//! Platter is the ordering core of a group food-ordering assistant: members fill carts from a
//! restaurant menu, and a deliverer consolidates those carts into a single purchase order.
//!
//! This crate holds the pure domain rules shared by every front end: roles and the authorization
//! predicate, cart and order status machines, input validation and the consolidated order
//! summary. It performs no I/O.

pub mod errors;
pub mod import;
pub mod money;
pub mod payment;
pub mod roles;
pub mod status;
pub mod summary;
pub mod validation;

pub use errors::{ErrorKind, UnknownVariant};
pub use payment::PaymentMethod;
pub use roles::Role;
pub use status::{CartStatus, InvalidTransition, OrderStatus};
