//! Hook events, payloads and outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;
use tessera_core::{Record, ValueErrorSet};
use tessera_registry::{Module, Namespace};

/// Point in the pipeline at which a hook runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HookEvent {
    BeforeCreate,
    AfterCreate,
    BeforeUpdate,
    AfterUpdate,
    BeforeDelete,
    AfterDelete,
    /// Once per record of an iteration.
    OnIteration,
    /// Explicitly triggered script.
    OnManual,
}

impl HookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookEvent::BeforeCreate => "beforeCreate",
            HookEvent::AfterCreate => "afterCreate",
            HookEvent::BeforeUpdate => "beforeUpdate",
            HookEvent::AfterUpdate => "afterUpdate",
            HookEvent::BeforeDelete => "beforeDelete",
            HookEvent::AfterDelete => "afterDelete",
            HookEvent::OnIteration => "onIteration",
            HookEvent::OnManual => "onManual",
        }
    }

    /// Before-hooks may change the record and stop the mutation.
    pub fn is_before(&self) -> bool {
        matches!(
            self,
            HookEvent::BeforeCreate | HookEvent::BeforeUpdate | HookEvent::BeforeDelete
        )
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a hook sees.
///
/// `record` is the new state and may be changed in place; `old` is the stored
/// state on update, delete and manual triggers. `errors` is the error set
/// accumulated so far, read-only: hooks report findings through
/// [`HookOutcome::Continue`].
pub struct HookPayload<'a> {
    pub event: HookEvent,
    pub namespace: &'a Namespace,
    pub module: &'a Module,
    pub record: &'a mut Record,
    pub old: Option<&'a Record>,
    pub errors: &'a ValueErrorSet,
    /// Script name for manual triggers.
    pub script: Option<&'a str>,
}

/// Result of a hook call.
#[derive(Debug, Clone, PartialEq)]
pub enum HookOutcome {
    /// Proceed; `errors` are appended to the caller's error set.
    Continue { errors: ValueErrorSet },
    /// Skip this record without failing.
    SoftAbort,
    /// Stop with an error.
    Fail(String),
}

impl HookOutcome {
    /// Continue without findings.
    pub fn proceed() -> Self {
        HookOutcome::Continue {
            errors: ValueErrorSet::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        HookOutcome::Fail(message.into())
    }

    pub fn is_continue(&self) -> bool {
        matches!(self, HookOutcome::Continue { .. })
    }
}

impl Default for HookOutcome {
    fn default() -> Self {
        Self::proceed()
    }
}
