//! Errors of the value pipeline.

use tessera_store::StoreError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type ValuesResult<T> = Result<T, ValuesError>;

/// Hard errors: the payload is malformed or a collaborator failed.
///
/// Business-rule violations are never reported here; they are collected in
/// a `ValueErrorSet` instead.
#[derive(Debug, Error)]
pub enum ValuesError {
    /// A value names a field the module does not define.
    #[error("field not found: {field}")]
    FieldNotFound { field: String },

    /// A single-value field carries more than one value.
    #[error("invalid value structure: field {field} is not multi-value")]
    InvalidValueStructure { field: String },

    /// A reference value is not a positive integer.
    #[error("invalid reference format for field {field}: {value:?}")]
    InvalidReferenceFormat { field: String, value: String },

    /// Store lookup failed during validation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ValuesError {
    pub fn field_not_found(field: impl Into<String>) -> Self {
        Self::FieldNotFound {
            field: field.into(),
        }
    }

    pub fn invalid_value_structure(field: impl Into<String>) -> Self {
        Self::InvalidValueStructure {
            field: field.into(),
        }
    }

    pub fn invalid_reference_format(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidReferenceFormat {
            field: field.into(),
            value: value.into(),
        }
    }
}
