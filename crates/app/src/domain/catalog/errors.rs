//! Catalog service errors.

use platter::{ErrorKind as Kind, validation::ValidationError};
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::domain::access::AccessError;

#[derive(Debug, Error)]
pub enum CatalogServiceError {
    #[error("catalog entry already exists")]
    AlreadyExists,

    #[error("catalog entry not found")]
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

impl CatalogServiceError {
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

impl From<Error> for CatalogServiceError {
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

impl From<AccessError> for CatalogServiceError {
    fn from(error: AccessError) -> Self {
        match error {
            AccessError::UnknownCaller | AccessError::Forbidden { .. } => Self::Forbidden,
            AccessError::Sql(error) => Self::Sql(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        let error = CatalogServiceError::from(Error::RowNotFound);

        assert!(matches!(error, CatalogServiceError::NotFound), "got {error:?}");
        assert_eq!(error.kind(), Kind::NotFound);
    }

    #[test]
    fn validation_errors_are_user_correctable() {
        let error = CatalogServiceError::from(ValidationError::NonPositivePrice);

        assert!(error.kind().is_user_correctable());
    }
}
