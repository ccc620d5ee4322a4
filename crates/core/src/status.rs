//! Cart and delivery order status machines.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::errors::UnknownVariant;

/// Lifecycle of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartStatus {
    /// Being filled by its owner.
    #[default]
    Active,

    /// Attached to a delivery order.
    Ordered,

    /// Its delivery order was delivered.
    Delivered,

    /// Abandoned by its owner.
    Cancelled,
}

impl CartStatus {
    /// Every cart status.
    pub const ALL: [CartStatus; 4] = [
        CartStatus::Active,
        CartStatus::Ordered,
        CartStatus::Delivered,
        CartStatus::Cancelled,
    ];

    /// Storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            CartStatus::Active => "active",
            CartStatus::Ordered => "ordered",
            CartStatus::Delivered => "delivered",
            CartStatus::Cancelled => "cancelled",
        }
    }

    /// Only active carts accept item changes.
    pub const fn is_editable(self) -> bool {
        matches!(self, CartStatus::Active)
    }

    /// Whether a cart in this status contributes to its delivery order's total.
    pub const fn counts_towards_order(self) -> bool {
        matches!(self, CartStatus::Ordered | CartStatus::Delivered)
    }
}

/// A cart may join a delivery order only while active and non-empty.
pub const fn is_attachable(status: CartStatus, item_count: usize) -> bool {
    status.is_editable() && item_count > 0
}

impl Display for CartStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for CartStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        CartStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| UnknownVariant::new("cart status", value))
    }
}

/// Lifecycle of a delivery order.
///
/// ```text
/// Collecting ──▶ Collected ──▶ Delivered
///     │              │
///     └──────┬───────┘
///            ▼
///        Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Accepting carts.
    #[default]
    Collecting,

    /// Closed to new carts and being purchased.
    Collected,

    /// Handed over to members.
    Delivered,

    /// Abandoned.
    Cancelled,
}

impl OrderStatus {
    /// Every order status.
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Collecting,
        OrderStatus::Collected,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Collecting => "collecting",
            OrderStatus::Collected => "collected",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Whether carts may be attached or detached.
    pub const fn accepts_carts(self) -> bool {
        matches!(self, OrderStatus::Collecting)
    }

    /// No transition leaves a terminal status.
    pub const fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Whether `self → next` is a legal transition.
    pub const fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Collecting, OrderStatus::Collected)
                | (OrderStatus::Collected, OrderStatus::Delivered)
                | (
                    OrderStatus::Collecting | OrderStatus::Collected,
                    OrderStatus::Cancelled
                )
        )
    }

    /// Validates `self → next`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] when the status machine forbids the move.
    pub const fn transition(self, next: OrderStatus) -> Result<OrderStatus, InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == value)
            .ok_or_else(|| UnknownVariant::new("order status", value))
    }
}

/// Rejected order status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot move order from {from} to {to}")]
pub struct InvalidTransition {
    /// Current status.
    pub from: OrderStatus,

    /// Requested status.
    pub to: OrderStatus,
}
