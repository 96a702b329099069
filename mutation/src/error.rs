//! Record service error types.

use tessera_core::{ModuleId, NamespaceId, RecordId, ValueErrorSet};
use tessera_hooks::HookEvent;
use tessera_import::ImportError;
use tessera_store::StoreError;
use tessera_values::ValuesError;
use thiserror::Error;

/// Result type for record service operations.
pub type RecordResult<T> = Result<T, RecordError>;

/// Errors of the record service.
///
/// Everything except [`RecordError::ValueInput`] is a hard error: the unit
/// of work stops and the error reaches the caller untouched. `ValueInput`
/// carries business-rule findings as data.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Field not found: {field}")]
    FieldNotFound { field: String },

    #[error("Invalid reference format for field {field}: {value:?}")]
    InvalidReferenceFormat { field: String, value: String },

    #[error("Invalid value structure: field {field} is not multi-value")]
    InvalidValueStructure { field: String },

    #[error("Invalid record ID")]
    InvalidId,

    #[error("Invalid namespace ID")]
    InvalidNamespaceId,

    #[error("Invalid module ID")]
    InvalidModuleId,

    #[error("Record not found: {0}")]
    NotFound(RecordId),

    #[error("Not allowed to create records on module {0}")]
    NotAllowedToCreate(ModuleId),

    #[error("Not allowed to read record {0}")]
    NotAllowedToRead(RecordId),

    #[error("Not allowed to update record {0}")]
    NotAllowedToUpdate(RecordId),

    #[error("Not allowed to delete record {0}")]
    NotAllowedToDelete(RecordId),

    #[error("Not allowed to search records of module {0}")]
    NotAllowedToSearch(ModuleId),

    #[error("Stale data: record {record_id} was changed since it was read")]
    StaleData { record_id: RecordId },

    #[error("Unknown bulk operation: {0}")]
    UnknownBulkOperation(String),

    #[error("Hook {event} failed: {message}")]
    HookFailed { event: HookEvent, message: String },

    #[error("Hook {event} aborted the mutation")]
    HookAborted { event: HookEvent },

    #[error("Invalid organize request: {reason}")]
    InvalidOrganize { reason: String },

    #[error("Namespace {0} is not readable")]
    NamespaceNotReadable(NamespaceId),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid record values: {0}")]
    ValueInput(ValueErrorSet),
}

impl RecordError {
    pub fn field_not_found(field: impl Into<String>) -> Self {
        Self::FieldNotFound {
            field: field.into(),
        }
    }

    pub fn stale_data(record_id: RecordId) -> Self {
        Self::StaleData { record_id }
    }

    pub fn hook_failed(event: HookEvent, message: impl Into<String>) -> Self {
        Self::HookFailed {
            event,
            message: message.into(),
        }
    }

    pub fn invalid_organize(reason: impl Into<String>) -> Self {
        Self::InvalidOrganize {
            reason: reason.into(),
        }
    }

    /// The value errors, when this is the value-input channel.
    pub fn value_errors(&self) -> Option<&ValueErrorSet> {
        match self {
            RecordError::ValueInput(errors) => Some(errors),
            _ => None,
        }
    }

    /// Returns true for any "does not exist" failure.
    pub fn is_not_found(&self) -> bool {
        match self {
            RecordError::NotFound(_) => true,
            RecordError::Store(e) => e.is_not_found(),
            _ => false,
        }
    }
}

impl From<ValuesError> for RecordError {
    fn from(e: ValuesError) -> Self {
        match e {
            ValuesError::FieldNotFound { field } => Self::FieldNotFound { field },
            ValuesError::InvalidValueStructure { field } => Self::InvalidValueStructure { field },
            ValuesError::InvalidReferenceFormat { field, value } => {
                Self::InvalidReferenceFormat { field, value }
            }
            ValuesError::Store(e) => Self::Store(e),
        }
    }
}
