//! Carts service errors.

use platter::{CartStatus, ErrorKind as Kind, validation::ValidationError};
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::access::AccessError;

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("cart already exists")]
    AlreadyExists,

    #[error("cart not found")]
    NotFound,

    #[error("item not in cart")]
    ItemNotFound,

    #[error("dish is not available from this restaurant")]
    DishUnavailable,

    #[error("cart is {status} and cannot be edited")]
    NotEditable { status: CartStatus },

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

impl CartsServiceError {
    pub fn kind(&self) -> Kind {
        match self {
            Self::AlreadyExists => Kind::Duplicate,
            Self::NotFound | Self::ItemNotFound | Self::InvalidReference => Kind::NotFound,
            Self::DishUnavailable
            | Self::MissingRequiredData
            | Self::InvalidData
            | Self::Invalid(_) => Kind::Validation,
            Self::NotEditable { .. } => Kind::StateConflict,
            Self::Forbidden => Kind::Authorization,
            Self::Sql(_) => Kind::Unexpected,
        }
    }
}

impl From<Error> for CartsServiceError {
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

impl From<AccessError> for CartsServiceError {
    fn from(error: AccessError) -> Self {
        match error {
            AccessError::UnknownCaller | AccessError::Forbidden { .. } => Self::Forbidden,
            AccessError::Sql(error) => Self::Sql(error),
        }
    }
}
