//! Import error types.

use thiserror::Error;

/// Result type for import bookkeeping.
pub type ImportResult<T> = Result<T, ImportError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    /// Unknown failure policy name.
    #[error("unknown on-error policy: {0}")]
    UnknownPolicy(String),

    /// A mapped source column names a field the module does not define.
    #[error("column {column} maps to unknown field {field}")]
    UnknownField { column: String, field: String },

    /// More than one column maps to a single-value field.
    #[error("columns {first} and {second} both map to single-value field {field}")]
    DuplicateField {
        field: String,
        first: String,
        second: String,
    },

    /// A stored fail log range ends before it starts.
    #[error("invalid fail log range [{start}, {end}]")]
    InvalidRange { start: usize, end: usize },
}

impl ImportError {
    pub fn unknown_field(column: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            column: column.into(),
            field: field.into(),
        }
    }
}
