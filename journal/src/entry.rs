//! Audit entry types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tessera_core::{ModuleId, NamespaceId, RecordId, UserId, ValueErrorSet};

/// Sequence number of a journal entry.
pub type Seq = u64;

/// Audited action tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordAction {
    Lookup,
    Search,
    Create,
    Update,
    Delete,
    Bulk,
    Organize,
    IteratorInvoked,
    IteratorIteration,
    IteratorClone,
    IteratorUpdate,
    IteratorDelete,
    Import,
    TriggerScript,
}

impl RecordAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordAction::Lookup => "lookup",
            RecordAction::Search => "search",
            RecordAction::Create => "create",
            RecordAction::Update => "update",
            RecordAction::Delete => "delete",
            RecordAction::Bulk => "bulk",
            RecordAction::Organize => "organize",
            RecordAction::IteratorInvoked => "iteratorInvoked",
            RecordAction::IteratorIteration => "iteratorIteration",
            RecordAction::IteratorClone => "iteratorClone",
            RecordAction::IteratorUpdate => "iteratorUpdate",
            RecordAction::IteratorDelete => "iteratorDelete",
            RecordAction::Import => "import",
            RecordAction::TriggerScript => "triggerScript",
        }
    }
}

impl fmt::Display for RecordAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Properties of an audited action. Unset properties are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_id: Option<NamespaceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_id: Option<ModuleId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<RecordId>,
    /// Rendered search or iteration filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    /// Number of operations in a bulk call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bulk_size: Option<usize>,
    /// Field names involved, e.g. the ordering field of a reorder.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_errors: Option<ValueErrorSet>,
}

impl ActionProps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(mut self, id: NamespaceId) -> Self {
        self.namespace_id = Some(id);
        self
    }

    pub fn module(mut self, id: ModuleId) -> Self {
        self.module_id = Some(id);
        self
    }

    pub fn record(mut self, id: RecordId) -> Self {
        self.record_id = Some(id);
        self
    }

    pub fn filter(mut self, filter: impl fmt::Display) -> Self {
        self.filter = Some(filter.to_string());
        self
    }

    pub fn bulk_size(mut self, size: usize) -> Self {
        self.bulk_size = Some(size);
        self
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(name.into());
        self
    }

    /// Attach value errors; an empty set is not recorded.
    pub fn value_errors(mut self, errors: &ValueErrorSet) -> Self {
        if !errors.is_empty() {
            self.value_errors = Some(errors.clone());
        }
        self
    }
}

/// A recorded action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub seq: Seq,
    pub at: DateTime<Utc>,
    pub invoker: UserId,
    pub action: RecordAction,
    pub props: ActionProps,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditEntry {
    /// Returns true if the action failed.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
