//! # Error Types
//!
//! Domain-specific error types for ferreteria-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ferreteria-core errors (this file)                                    │
//! │  ├── ValidationError   - One field-scoped violation                    │
//! │  ├── ValidationErrors  - Every violation found in one pass             │
//! │  └── CoreError         - Domain rule failures                          │
//! │                                                                         │
//! │  ferreteria-db errors (separate crate)                                 │
//! │  └── DbError           - Store failures                                │
//! │                                                                         │
//! │  inventory-server                                                      │
//! │  └── ServiceError      - What the envelope reports                     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError → envelope           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule failures.
#[derive(Debug, Error)]
pub enum CoreError {
    /// One or more field rules failed.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// Another item already uses this code (active or retired).
    #[error("Item code already exists: {0}")]
    DuplicateCode(String),

    /// A withdrawal would take stock below zero.
    ///
    /// ## When This Occurs
    /// ```text
    /// current_stock = 2
    /// adjust_stock(delta = -10)
    ///      │
    ///      ▼
    /// InsufficientStock { code: "ABC1", available: 2, requested: 10 }
    /// ```
    #[error("Insufficient stock for {code}. Current stock: {available}, requested withdrawal: {requested}")]
    InsufficientStock {
        code: String,
        available: i64,
        requested: i64,
    },

    /// A stock adjustment of zero units.
    #[error("Stock change must not be zero")]
    ZeroDelta,

    /// No item with the given key.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Writes are refused once an item is retired.
    #[error("Item is retired: {0}")]
    ItemRetired(String),
}

// =============================================================================
// Validation Error
// =============================================================================

/// A single field-scoped violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., lowercase punctuation in a code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Cross-field ordering, e.g. sale price over purchase price.
    #[error("{field} must be greater than {other}")]
    MustExceed { field: String, other: String },

    /// Value is technically valid but beyond a business sanity limit.
    #[error("{field} is excessive: {reason}")]
    Excessive { field: String, reason: String },

    /// A foreign id (category, supplier) that matches no row.
    #[error("{field} references no existing record: {id}")]
    UnknownReference { field: String, id: i64 },
}

impl ValidationError {
    /// Shorthand used throughout the validator.
    pub fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }
}

/// Every violation found for one input. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Returns `Ok(())` for an empty list, the collected errors otherwise.
    pub fn check(errors: Vec<ValidationError>) -> Result<(), ValidationErrors> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }

    pub fn single(error: ValidationError) -> Self {
        ValidationErrors(vec![error])
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("validation failed: ")?;
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(err: ValidationError) -> Self {
        ValidationErrors::single(err)
    }
}

impl From<ValidationError> for CoreError {
    fn from(err: ValidationError) -> Self {
        CoreError::Validation(err.into())
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            code: "ABC1".to_string(),
            available: 2,
            requested: 10,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for ABC1. Current stock: 2, requested withdrawal: 10"
        );
        assert_eq!(
            CoreError::DuplicateCode("ABC1".into()).to_string(),
            "Item code already exists: ABC1"
        );
    }

    #[test]
    fn test_validation_errors_join() {
        let errs = ValidationErrors::check(vec![
            ValidationError::required("code"),
            ValidationError::TooShort {
                field: "name".to_string(),
                min: 3,
            },
        ])
        .unwrap_err();

        assert_eq!(errs.len(), 2);
        assert_eq!(
            errs.to_string(),
            "validation failed: code is required, name must be at least 3 characters"
        );
    }

    #[test]
    fn test_empty_list_is_ok() {
        assert!(ValidationErrors::check(Vec::new()).is_ok());
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("code").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.to_string(), "validation failed: code is required");
    }
}
