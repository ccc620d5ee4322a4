//! Users service errors.

use platter::{ErrorKind as Kind, validation::ValidationError};
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::access::AccessError;

#[derive(Debug, Error)]
pub enum UsersServiceError {
    #[error("user already exists")]
    AlreadyExists,

    #[error("user not found")]
    NotFound,

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

impl UsersServiceError {
    pub fn kind(&self) -> Kind {
        match self {
            Self::AlreadyExists => Kind::Duplicate,
            Self::NotFound | Self::InvalidReference => Kind::NotFound,
            Self::MissingRequiredData | Self::InvalidData | Self::Invalid(_) => Kind::Validation,
            Self::Forbidden => Kind::Authorization,
            Self::Sql(_) => Kind::Unexpected,
        }
    }
}

impl From<Error> for UsersServiceError {
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

impl From<AccessError> for UsersServiceError {
    fn from(error: AccessError) -> Self {
        match error {
            AccessError::UnknownCaller | AccessError::Forbidden { .. } => Self::Forbidden,
            AccessError::Sql(error) => Self::Sql(error),
        }
    }
}
