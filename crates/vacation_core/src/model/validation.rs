//! Entity validation errors raised before writes reach storage.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failure for one entity field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityValidationError {
    EmptyField {
        entity: &'static str,
        field: &'static str,
    },
    InvalidEmail(String),
    /// Email is not in canonical form (trimmed, lowercase).
    EmailNotNormalized(String),
}

impl Display for EntityValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField { entity, field } => {
                write!(f, "{entity}.{field} must not be empty")
            }
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
            Self::EmailNotNormalized(value) => {
                write!(f, "email address `{value}` must be trimmed and lowercase")
            }
        }
    }
}

impl Error for EntityValidationError {}

/// Rejects values that are empty after trimming.
pub(crate) fn require_non_empty(
    entity: &'static str,
    field: &'static str,
    value: &str,
) -> Result<(), EntityValidationError> {
    if value.trim().is_empty() {
        return Err(EntityValidationError::EmptyField { entity, field });
    }
    Ok(())
}
