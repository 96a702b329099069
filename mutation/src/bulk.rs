//! Bulk coordinator.
//!
//! Runs a list of create/update/delete operations in order through the
//! single-record paths, inside one enclosing transaction. Value errors of one
//! operation are collected and tagged with the operation's identifier; any
//! other error stops the batch and rolls back every write it made.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tessera_core::{Context, Record, RecordValue, ValueErrorSet};
use tessera_journal::{ActionProps, RecordAction};
use tessera_store::with_transaction;
use tracing::debug_span;

use crate::error::{RecordError, RecordResult};
use crate::service::RecordService;

/// Kind of a bulk operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkKind {
    Create,
    Update,
    Delete,
}

impl FromStr for BulkKind {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(BulkKind::Create),
            "update" => Ok(BulkKind::Update),
            "delete" => Ok(BulkKind::Delete),
            other => Err(RecordError::UnknownBulkOperation(other.to_string())),
        }
    }
}

/// One operation of a bulk call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperation {
    /// `create`, `update` or `delete`; anything else rejects the whole batch.
    #[serde(rename = "operation")]
    pub kind: String,
    pub record: Record,
    /// Field that receives the ID of the batch's first stored record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_by: Option<String>,
    /// Caller-supplied identifier copied onto this operation's value errors.
    #[serde(default)]
    pub id: String,
}

impl BulkOperation {
    pub fn new(kind: impl Into<String>, record: Record) -> Self {
        Self {
            kind: kind.into(),
            record,
            link_by: None,
            id: String::new(),
        }
    }

    pub fn create(record: Record) -> Self {
        Self::new("create", record)
    }

    pub fn update(record: Record) -> Self {
        Self::new("update", record)
    }

    pub fn delete(record: Record) -> Self {
        Self::new("delete", record)
    }

    pub fn linked_by(mut self, field: impl Into<String>) -> Self {
        self.link_by = Some(field.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Result of a bulk call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkOutcome {
    /// Records stored, in operation order.
    pub records: Vec<Record>,
    /// Value errors of every failed operation, tagged with `id`.
    pub errors: ValueErrorSet,
}

impl BulkOutcome {
    pub fn is_valid(&self) -> bool {
        self.errors.is_valid()
    }
}

impl RecordService {
    /// Run a batch of operations.
    ///
    /// Each operation is audited on its own; batches of two or more also get
    /// one `bulk` summary entry, whatever the outcome.
    pub fn bulk(&self, ctx: &Context, operations: Vec<BulkOperation>) -> RecordResult<BulkOutcome> {
        let _span = debug_span!("record.bulk", size = operations.len()).entered();

        let size = operations.len();
        let props = ActionProps::new().bulk_size(size);
        let result = self.run_bulk(ctx, operations);

        if size > 1 {
            match &result {
                Ok(outcome) if !outcome.is_valid() => {
                    let err = RecordError::ValueInput(outcome.errors.clone());
                    self.audit_error(ctx, RecordAction::Bulk, props, &err);
                }
                _ => self.audit_result(ctx, RecordAction::Bulk, props, &result),
            }
        }
        result
    }

    fn run_bulk(&self, ctx: &Context, operations: Vec<BulkOperation>) -> RecordResult<BulkOutcome> {
        let kinds = operations
            .iter()
            .map(|op| op.kind.parse::<BulkKind>())
            .collect::<RecordResult<Vec<_>>>()?;

        // Single-record writes nest inside this scope.
        let outcome = with_transaction::<_, RecordError, _>(self.store.as_ref(), |_batch| {
            let mut outcome = BulkOutcome::default();
            for (op, kind) in operations.into_iter().zip(kinds) {
                self.run_operation(ctx, op, kind, &mut outcome)?;
            }
            Ok(outcome)
        })?;

        tracing::debug!(
            stored = outcome.records.len(),
            errors = outcome.errors.len(),
            "bulk finished"
        );
        Ok(outcome)
    }

    fn run_operation(
        &self,
        ctx: &Context,
        op: BulkOperation,
        kind: BulkKind,
        outcome: &mut BulkOutcome,
    ) -> RecordResult<()> {
        let mut record = op.record;

        if let Some(field) = &op.link_by {
            let link = match outcome.records.first() {
                Some(primary) => {
                    RecordValue::new(field, primary.id.raw().to_string()).with_ref(primary.id.raw())
                }
                None => RecordValue::new(field, ""),
            };
            record.values.set(link);
        }

        let result = match kind {
            BulkKind::Create => self.create(ctx, record),
            BulkKind::Update => self.update(ctx, record),
            BulkKind::Delete => self.delete(ctx, record.namespace_id, record.module_id, record.id),
        };

        match result {
            Ok(stored) => outcome.records.push(stored),
            Err(RecordError::ValueInput(mut errors)) => {
                errors.tag_all("id", op.id.as_str());
                outcome.errors.merge(errors);
            }
            Err(err) => return Err(err),
        }
        Ok(())
    }
}
