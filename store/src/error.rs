//! Store error types.

use tessera_core::{ModuleId, RecordId};
use tessera_registry::RegistryError;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Schema lookup failed.
    #[error("schema error: {0}")]
    Registry(#[from] RegistryError),

    /// Record not found.
    #[error("record not found: {record_id} in module {module_id}")]
    RecordNotFound {
        module_id: ModuleId,
        record_id: RecordId,
    },

    /// A record with the same ID already exists.
    #[error("record already exists: {0}")]
    Conflict(RecordId),

    /// Backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn record_not_found(module_id: ModuleId, record_id: RecordId) -> Self {
        Self::RecordNotFound {
            module_id,
            record_id,
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Returns true for any "does not exist" failure.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::RecordNotFound { .. }
                | StoreError::Registry(RegistryError::ModuleNotFound(_))
                | StoreError::Registry(RegistryError::NamespaceNotFound(_))
        )
    }
}
