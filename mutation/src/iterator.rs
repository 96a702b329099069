//! Batch iterator.
//!
//! Walks a filtered record set and hands each record to a caller-supplied
//! hook. Depending on the declared action the hook's result is then cloned,
//! updated or deleted through the single-record write paths. There is no
//! rollback across records: mutations applied before a failure stand.

use std::fmt;
use std::str::FromStr;
use tessera_core::{Context, Record, ValueErrorSet};
use tessera_hooks::{HookEvent, HookOutcome, HookPayload};
use tessera_journal::{ActionProps, RecordAction};
use tessera_registry::{Module, Namespace};
use tessera_store::RecordFilter;
use tracing::debug_span;

use crate::error::{RecordError, RecordResult};
use crate::ops::{create, delete, update};
use crate::service::RecordService;

/// What happens to each iterated record after the hook ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IteratorAction {
    /// Observe only.
    #[default]
    None,
    /// Store the hook's record as a new record.
    Clone,
    Update,
    Delete,
}

impl IteratorAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            IteratorAction::None => "",
            IteratorAction::Clone => "clone",
            IteratorAction::Update => "update",
            IteratorAction::Delete => "delete",
        }
    }

    fn audit_action(&self) -> RecordAction {
        match self {
            IteratorAction::None => RecordAction::IteratorIteration,
            IteratorAction::Clone => RecordAction::IteratorClone,
            IteratorAction::Update => RecordAction::IteratorUpdate,
            IteratorAction::Delete => RecordAction::IteratorDelete,
        }
    }
}

impl FromStr for IteratorAction {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(IteratorAction::None),
            "clone" => Ok(IteratorAction::Clone),
            "update" => Ok(IteratorAction::Update),
            "delete" => Ok(IteratorAction::Delete),
            other => Err(RecordError::UnknownBulkOperation(other.to_string())),
        }
    }
}

impl fmt::Display for IteratorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts of one iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IterationSummary {
    /// Records handed to the hook.
    pub visited: usize,
    /// Records the hook skipped with a soft abort.
    pub skipped: usize,
    /// Records cloned, updated or deleted.
    pub mutated: usize,
}

impl RecordService {
    /// Run `hook` for every record matching `filter`, then apply `action`.
    ///
    /// A soft abort from the hook skips the record; a hook failure, a
    /// permission failure or a failed write stops the iteration.
    pub fn iterate<F>(
        &self,
        ctx: &Context,
        filter: RecordFilter,
        action: IteratorAction,
        hook: F,
    ) -> RecordResult<IterationSummary>
    where
        F: Fn(&Context, &mut HookPayload<'_>) -> HookOutcome,
    {
        let _span = debug_span!(
            "record.iterate",
            namespace_id = %filter.namespace_id,
            module_id = %filter.module_id,
            action = %action
        )
        .entered();

        let mut props = ActionProps::new()
            .namespace(filter.namespace_id)
            .module(filter.module_id);
        if let Some(query) = &filter.query {
            props = props.filter(query);
        }

        let result = self.run_iteration(ctx, filter, action, &hook);
        self.audit_result(ctx, RecordAction::IteratorInvoked, props, &result);
        result
    }

    fn run_iteration(
        &self,
        ctx: &Context,
        filter: RecordFilter,
        action: IteratorAction,
        hook: &dyn Fn(&Context, &mut HookPayload<'_>) -> HookOutcome,
    ) -> RecordResult<IterationSummary> {
        let (namespace, module) = self.load_module(filter.namespace_id, filter.module_id)?;
        let (set, _) = self.store.search_records(&module, &filter)?;

        let mut summary = IterationSummary::default();
        for old in set {
            self.check_iteration_access(ctx, &module, &old, action)?;
            summary.visited += 1;

            let props = ActionProps::new()
                .namespace(namespace.id)
                .module(module.id)
                .record(old.id);

            let mut record = old.clone();
            let outcome = match self.visit(ctx, &namespace, &module, &old, &mut record, hook) {
                Ok(outcome) => outcome,
                Err(err) => {
                    self.audit_error(ctx, RecordAction::IteratorIteration, props, &err);
                    return Err(err);
                }
            };

            if outcome == Visit::Skip {
                summary.skipped += 1;
                self.audit
                    .record(ctx, RecordAction::IteratorIteration, props, None);
                continue;
            }

            let result = match action {
                IteratorAction::None => Ok(record),
                IteratorAction::Clone => create::clone_record(self, ctx, &module, record),
                IteratorAction::Update => update::apply_iteration(self, ctx, &module, &old, record),
                IteratorAction::Delete => delete::soft_delete(self, ctx, &module, &old),
            };

            let props = match &result {
                Ok(stored) => props.record(stored.id),
                Err(_) => props,
            };
            self.audit_result(ctx, action.audit_action(), props, &result);
            result?;

            if action != IteratorAction::None {
                summary.mutated += 1;
            }
        }

        tracing::debug!(
            visited = summary.visited,
            skipped = summary.skipped,
            mutated = summary.mutated,
            "iteration finished"
        );
        Ok(summary)
    }

    fn visit(
        &self,
        ctx: &Context,
        namespace: &Namespace,
        module: &Module,
        old: &Record,
        record: &mut Record,
        hook: &dyn Fn(&Context, &mut HookPayload<'_>) -> HookOutcome,
    ) -> RecordResult<Visit> {
        let no_errors = ValueErrorSet::new();
        let mut payload = HookPayload {
            event: HookEvent::OnIteration,
            namespace,
            module,
            record,
            old: Some(old),
            errors: &no_errors,
            script: None,
        };

        match hook(ctx, &mut payload) {
            HookOutcome::Continue { errors } if errors.is_valid() => Ok(Visit::Apply),
            HookOutcome::Continue { errors } => Err(RecordError::ValueInput(errors)),
            HookOutcome::SoftAbort => Ok(Visit::Skip),
            HookOutcome::Fail(message) => {
                Err(RecordError::hook_failed(HookEvent::OnIteration, message))
            }
        }
    }

    fn check_iteration_access(
        &self,
        ctx: &Context,
        module: &Module,
        record: &Record,
        action: IteratorAction,
    ) -> RecordResult<()> {
        match action {
            IteratorAction::Clone if !self.access.can_create_record_on_module(ctx, module) => {
                return Err(RecordError::NotAllowedToCreate(module.id));
            }
            IteratorAction::Update if !self.access.can_update_record(ctx, record) => {
                return Err(RecordError::NotAllowedToUpdate(record.id));
            }
            IteratorAction::Delete if !self.access.can_delete_record(ctx, record) => {
                return Err(RecordError::NotAllowedToDelete(record.id));
            }
            _ => {}
        }

        if !self.access.can_read_record(ctx, record) {
            return Err(RecordError::NotAllowedToRead(record.id));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Apply,
    Skip,
}
