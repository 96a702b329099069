//! The record structure.

use crate::{ModuleId, NamespaceId, RecordId, RecordValue, RecordValueSet, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored record of a module.
///
/// `module_id` never changes after creation. Deletion is soft: a non-null
/// `deleted_at` marks the record as tombstoned but it stays addressable by ID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: RecordId,
    pub namespace_id: NamespaceId,
    pub module_id: ModuleId,
    #[serde(default)]
    pub values: RecordValueSet,
    #[serde(default)]
    pub owned_by: UserId,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: UserId,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_by: UserId,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted_by: UserId,
}

impl Record {
    /// Create an empty, unsaved record for a module.
    pub fn new(namespace_id: NamespaceId, module_id: ModuleId) -> Self {
        Self {
            namespace_id,
            module_id,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = id;
        self
    }

    pub fn with_values(mut self, values: RecordValueSet) -> Self {
        self.values = values;
        self
    }

    /// Set (or replace) a single value at place 0.
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.set(RecordValue::new(name, value));
        self
    }

    pub fn owned_by(mut self, owner: UserId) -> Self {
        self.owned_by = owner;
        self
    }

    /// Returns true if the record was soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// The timestamp compared against client expectations on update.
    pub fn concurrency_stamp(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }

    /// First value of a field, if any.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.first(name).map(|v| v.value.as_str())
    }
}
