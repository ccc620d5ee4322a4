//! Catalog Data

use platter::validation::ValidationError;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::catalog::records::{CategoryUuid, DishRecord, DishUuid, RestaurantUuid};

/// New Restaurant Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRestaurant {
    pub uuid: RestaurantUuid,
    pub name: String,
}

/// New Category Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub uuid: CategoryUuid,
    pub restaurant: RestaurantUuid,
    pub name: String,
}

/// New Dish Data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDish {
    pub uuid: DishUuid,
    pub category: CategoryUuid,
    pub name: String,
    pub price: Decimal,
}

/// Which catalog entries a listing includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Active,
    Inactive,
    All,
}

impl Visibility {
    pub(crate) fn as_filter(self) -> Option<bool> {
        match self {
            Visibility::Active => Some(true),
            Visibility::Inactive => Some(false),
            Visibility::All => None,
        }
    }
}

/// Why one import entry was not created.
#[derive(Debug, Error)]
pub enum DishImportError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("rejected by storage")]
    Rejected(#[source] sqlx::Error),
}

/// An import entry that was skipped.
#[derive(Debug)]
pub struct DishImportFailure {
    /// Line number in the submitted text.
    pub line: usize,
    pub name: String,
    pub reason: DishImportError,
}

/// Outcome of a bulk dish import.
#[derive(Debug, Default)]
pub struct DishImportReport {
    pub created: Vec<DishRecord>,
    pub failed: Vec<DishImportFailure>,
}

impl DishImportReport {
    /// Number of entries processed.
    pub fn total(&self) -> usize {
        self.created.len() + self.failed.len()
    }
}
