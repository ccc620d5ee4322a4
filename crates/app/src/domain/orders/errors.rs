//! Orders service errors.

use platter::{
    CartStatus, ErrorKind as Kind, InvalidTransition, OrderStatus, Role,
    validation::ValidationError,
};
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::access::AccessError;

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order already exists")]
    AlreadyExists,

    #[error("order not found")]
    NotFound,

    #[error("cart not found")]
    CartNotFound,

    #[error("order is {status} and no longer accepts carts")]
    NotAccepting { status: OrderStatus },

    #[error("cart and order are for different restaurants")]
    RestaurantMismatch,

    #[error("cart is {status} with {item_count} items and cannot be attached")]
    CartNotAttachable {
        status: CartStatus,
        item_count: usize,
    },

    #[error("cart is not attached to this order")]
    CartNotInOrder,

    #[error("a {role} cannot deliver orders")]
    NotOrderManager { role: Role },

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("related resource not found")]
    InvalidReference,

    #[error("missing required data")]
    MissingRequiredData,

    #[error("invalid data")]
    InvalidData,

    #[error("not permitted")]
    Forbidden,

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl OrdersServiceError {
    pub fn kind(&self) -> Kind {
        match self {
            Self::AlreadyExists => Kind::Duplicate,
            Self::NotFound | Self::CartNotFound | Self::InvalidReference => Kind::NotFound,
            Self::NotAccepting { .. }
            | Self::CartNotAttachable { .. }
            | Self::CartNotInOrder
            | Self::InvalidTransition(_) => Kind::StateConflict,
            Self::RestaurantMismatch
            | Self::NotOrderManager { .. }
            | Self::MissingRequiredData
            | Self::InvalidData
            | Self::Invalid(_) => Kind::Validation,
            Self::Forbidden => Kind::Authorization,
            Self::Sql(_) => Kind::Unexpected,
        }
    }
}

impl From<Error> for OrdersServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation) => Self::MissingRequiredData,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

impl From<AccessError> for OrdersServiceError {
    fn from(error: AccessError) -> Self {
        match error {
            AccessError::UnknownCaller | AccessError::Forbidden { .. } => Self::Forbidden,
            AccessError::Sql(error) => Self::Sql(error),
        }
    }
}
