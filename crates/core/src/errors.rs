//! Error classification shared by every service.

use std::fmt::{Display, Formatter, Result as FmtResult};

use thiserror::Error;

/// Coarse classification of a failed operation.
///
/// Front ends use this to decide between re-prompting the user (validation), showing a
/// "not found" or "not allowed" message, or reporting an unexpected failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or out-of-range input.
    Validation,

    /// The referenced entity does not exist or is not visible to the caller.
    NotFound,

    /// The caller's role does not permit the operation.
    Authorization,

    /// The entity exists but is in the wrong state for the operation.
    StateConflict,

    /// A uniqueness constraint was violated.
    Duplicate,

    /// Storage or infrastructure failure.
    Unexpected,
}

impl ErrorKind {
    /// Whether the caller can fix the problem by changing their input.
    pub const fn is_user_correctable(self) -> bool {
        matches!(self, Self::Validation | Self::Duplicate)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let label = match self {
            Self::Validation => "validation",
            Self::NotFound => "not found",
            Self::Authorization => "authorization",
            Self::StateConflict => "state conflict",
            Self::Duplicate => "duplicate",
            Self::Unexpected => "unexpected",
        };

        f.write_str(label)
    }
}

/// A stored enumeration value that does not match any known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }

    /// The name of the enumeration that failed to parse.
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_input_errors_are_user_correctable() {
        assert!(ErrorKind::Validation.is_user_correctable());
        assert!(ErrorKind::Duplicate.is_user_correctable());
        assert!(!ErrorKind::Authorization.is_user_correctable());
        assert!(!ErrorKind::Unexpected.is_user_correctable());
    }

    #[test]
    fn unknown_variant_message_names_the_kind() {
        let error = UnknownVariant::new("role", "owner");

        assert_eq!(error.to_string(), "unknown role value: \"owner\"");
        assert_eq!(error.kind(), "role");
    }
}
