//! # Error Types
//!
//! Domain-specific error types for khata-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  khata-core errors (this file)                                         │
//! │  ├── CoreError        - Lookups and rule violations                    │
//! │  └── ValidationError  - Field-level input failures                     │
//! │                                                                         │
//! │  khata-db errors (separate crate)                                      │
//! │  └── DbError          - StorageUnavailable, NotFound, Corrupt, ...     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError / DbError → UI collaborator         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The invoice editor never returns these for bad keystrokes: a negative or
//! malformed entry is dropped and the previous value stays. They surface
//! from the explicit `validate_*` helpers and from invariant checks on
//! records handed to a repository.

use thiserror::Error;

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No line for the given product exists in the invoice being composed.
    #[error("No invoice line for product {0}")]
    LineNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (phone number, amount text, identifier).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A derived amount does not match what its parts add up to.
    #[error("{field} is {actual}, expected {expected}")]
    Inconsistent {
        field: String,
        expected: i64,
        actual: i64,
    },
}

impl ValidationError {
    pub(crate) fn inconsistent(field: impl Into<String>, expected: i64, actual: i64) -> Self {
        ValidationError::Inconsistent {
            field: field.into(),
            expected,
            actual,
        }
    }
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::inconsistent("subtotal", 300, 299);
        assert_eq!(err.to_string(), "subtotal is 299, expected 300");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(
            core_err.to_string(),
            "Validation error: quantity must be positive"
        );
    }
}
