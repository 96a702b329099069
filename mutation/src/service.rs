//! Record service - coordinates record operations.
//!
//! The service delegates to operation modules:
//! - `ops/create.rs` - record creation and cloning
//! - `ops/update.rs` - update with merge and staleness check
//! - `ops/delete.rs` - soft deletion
//! - `ops/lookup.rs` - reads with redaction
//! - `ops/script.rs` - validation and manual script triggers
//!
//! Batch entry points live in `bulk`, `reorder`, `iterator` and `import`.
//! Every public operation opens a `debug_span` and reports to the audit
//! recorder exactly once.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tessera_access::AccessControl;
use tessera_core::{
    Clock, Context, IdGenerator, ModuleId, MonotonicClock, NamespaceId, Record, RecordId,
    RecordValueSet, ValueErrorSet,
};
use tessera_hooks::{HookDispatcher, HookEvent, HookOutcome, HookPayload, NoopDispatcher};
use tessera_journal::{ActionProps, AuditRecorder, NullRecorder, RecordAction};
use tessera_registry::{Module, Namespace};
use tessera_store::{RecordFilter, Store};
use tessera_values::Pipeline;
use tracing::debug_span;

use crate::config::ServiceConfig;
use crate::error::{RecordError, RecordResult};
use crate::ops;

/// A stored mutation plus the error of its after-hook, if any.
///
/// After-hooks are best-effort: their failure never reaches the caller but
/// is kept for the audit trail.
#[derive(Debug)]
pub(crate) struct Applied {
    pub record: Record,
    pub hook_error: Option<String>,
}

/// The record mutation pipeline.
///
/// Collaborators are injected once at construction and shared by every call.
pub struct RecordService {
    pub(crate) store: Arc<dyn Store>,
    pub(crate) access: Arc<dyn AccessControl>,
    pub(crate) hooks: Arc<dyn HookDispatcher>,
    pub(crate) audit: Arc<dyn AuditRecorder>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) ids: Arc<IdGenerator>,
    pub(crate) config: ServiceConfig,
}

impl RecordService {
    /// Create a service without hooks or audit recording.
    pub fn new(store: Arc<dyn Store>, access: Arc<dyn AccessControl>) -> Self {
        Self {
            store,
            access,
            hooks: Arc::new(NoopDispatcher),
            audit: Arc::new(NullRecorder),
            clock: Arc::new(MonotonicClock::new()),
            ids: Arc::new(IdGenerator::new()),
            config: ServiceConfig::default(),
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn HookDispatcher>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditRecorder>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ids(mut self, ids: Arc<IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Turn before/after hooks on or off.
    pub fn event_emitting(mut self, enabled: bool) -> Self {
        self.config.emit_events = enabled;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    // ==================== Single-record operations ====================

    /// Create a record.
    pub fn create(&self, ctx: &Context, new: Record) -> RecordResult<Record> {
        let _span = debug_span!(
            "record.create",
            namespace_id = %new.namespace_id,
            module_id = %new.module_id
        )
        .entered();

        let props = ActionProps::new()
            .namespace(new.namespace_id)
            .module(new.module_id);
        let result = ops::create::execute(self, ctx, new);
        self.finish(ctx, RecordAction::Create, props, result)
    }

    /// Update a record.
    ///
    /// When `upd.updated_at` is set it must match the stored concurrency
    /// stamp; otherwise the update fails with `StaleData`.
    pub fn update(&self, ctx: &Context, upd: Record) -> RecordResult<Record> {
        let _span = debug_span!(
            "record.update",
            namespace_id = %upd.namespace_id,
            module_id = %upd.module_id,
            record_id = %upd.id
        )
        .entered();

        let props = ActionProps::new()
            .namespace(upd.namespace_id)
            .module(upd.module_id)
            .record(upd.id);
        let result = ops::update::execute(self, ctx, upd);
        self.finish(ctx, RecordAction::Update, props, result)
    }

    /// Soft-delete a record.
    pub fn delete(
        &self,
        ctx: &Context,
        namespace_id: NamespaceId,
        module_id: ModuleId,
        record_id: RecordId,
    ) -> RecordResult<Record> {
        let _span = debug_span!(
            "record.delete",
            namespace_id = %namespace_id,
            module_id = %module_id,
            record_id = %record_id
        )
        .entered();

        let props = ActionProps::new()
            .namespace(namespace_id)
            .module(module_id)
            .record(record_id);
        let result = ops::delete::execute(self, ctx, namespace_id, module_id, record_id);
        self.finish(ctx, RecordAction::Delete, props, result)
    }

    /// Soft-delete several records.
    ///
    /// With more than one ID a failing record is logged and skipped; with a
    /// single ID its error is returned.
    pub fn delete_by_id(
        &self,
        ctx: &Context,
        namespace_id: NamespaceId,
        module_id: ModuleId,
        record_ids: &[RecordId],
    ) -> RecordResult<()> {
        if namespace_id.is_zero() {
            return Err(RecordError::InvalidNamespaceId);
        }
        if module_id.is_zero() {
            return Err(RecordError::InvalidModuleId);
        }

        for &record_id in record_ids {
            match self.delete(ctx, namespace_id, module_id, record_id) {
                Ok(_) => {}
                Err(err) if record_ids.len() > 1 => {
                    tracing::warn!(record_id = %record_id, error = %err, "skipping record that could not be deleted");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Load one record, sanitized for display and redacted to readable fields.
    pub fn find_by_id(
        &self,
        ctx: &Context,
        namespace_id: NamespaceId,
        module_id: ModuleId,
        record_id: RecordId,
    ) -> RecordResult<Record> {
        let _span = debug_span!("record.find_by_id", record_id = %record_id).entered();

        let props = ActionProps::new()
            .namespace(namespace_id)
            .module(module_id)
            .record(record_id);
        let result = ops::lookup::find_by_id(self, ctx, namespace_id, module_id, record_id);
        self.audit_result(ctx, RecordAction::Lookup, props, &result);
        result
    }

    /// Search records the caller may read.
    ///
    /// Returns the records and the filter as resolved by the store.
    pub fn find(
        &self,
        ctx: &Context,
        filter: RecordFilter,
    ) -> RecordResult<(Vec<Record>, RecordFilter)> {
        let _span = debug_span!(
            "record.find",
            namespace_id = %filter.namespace_id,
            module_id = %filter.module_id
        )
        .entered();

        let mut props = ActionProps::new()
            .namespace(filter.namespace_id)
            .module(filter.module_id);
        if let Some(query) = &filter.query {
            props = props.filter(query);
        }
        let result = ops::lookup::find(self, ctx, filter);
        self.audit_result(ctx, RecordAction::Search, props, &result);
        result
    }

    /// Sanitize and validate a record without storing it.
    pub fn validate(&self, ctx: &Context, record: &Record) -> RecordResult<ValueErrorSet> {
        let _span = debug_span!("record.validate", module_id = %record.module_id).entered();
        ops::script::validate(self, ctx, record)
    }

    /// Run a manually triggered script against a record and submitted values.
    ///
    /// Nothing is stored; the record as left by the script is returned.
    pub fn trigger_script(
        &self,
        ctx: &Context,
        namespace_id: NamespaceId,
        module_id: ModuleId,
        record_id: RecordId,
        values: RecordValueSet,
        script: &str,
    ) -> RecordResult<Record> {
        let _span = debug_span!("record.trigger_script", record_id = %record_id, script).entered();

        let props = ActionProps::new()
            .namespace(namespace_id)
            .module(module_id)
            .record(record_id);
        let result =
            ops::script::trigger(self, ctx, namespace_id, module_id, record_id, values, script);
        self.audit_result(ctx, RecordAction::TriggerScript, props, &result);
        result
    }

    // ==================== Shared helpers ====================

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn pipeline(&self) -> Pipeline<'_> {
        Pipeline::new(self.store.as_ref())
    }

    /// Load a module and its namespace; zero IDs are rejected.
    pub(crate) fn load_module(
        &self,
        namespace_id: NamespaceId,
        module_id: ModuleId,
    ) -> RecordResult<(Namespace, Module)> {
        if namespace_id.is_zero() {
            return Err(RecordError::InvalidNamespaceId);
        }
        if module_id.is_zero() {
            return Err(RecordError::InvalidModuleId);
        }
        Ok(self
            .store
            .lookup_module_with_namespace(namespace_id, module_id)?)
    }

    /// Load namespace, module and record in one go.
    pub(crate) fn load_record(
        &self,
        namespace_id: NamespaceId,
        module_id: ModuleId,
        record_id: RecordId,
    ) -> RecordResult<(Namespace, Module, Record)> {
        if record_id.is_zero() {
            return Err(RecordError::InvalidId);
        }
        let (namespace, module) = self.load_module(namespace_id, module_id)?;
        let record = match self.store.lookup_record(&module, record_id) {
            Ok(record) => record,
            Err(e) if e.is_not_found() => return Err(RecordError::NotFound(record_id)),
            Err(e) => return Err(e.into()),
        };
        if record.module_id != module.id {
            return Err(RecordError::InvalidModuleId);
        }
        Ok((namespace, module, record))
    }

    /// Run a before-hook and translate its outcome.
    ///
    /// Returns the findings the hooks reported; an abort or a failure stops
    /// the mutation.
    pub(crate) fn before_hook(
        &self,
        ctx: &Context,
        payload: HookPayload<'_>,
    ) -> RecordResult<ValueErrorSet> {
        let event = payload.event;
        match self.hooks.invoke(ctx, payload) {
            HookOutcome::Continue { errors } => Ok(errors),
            HookOutcome::SoftAbort => Err(RecordError::HookAborted { event }),
            HookOutcome::Fail(message) => Err(RecordError::hook_failed(event, message)),
        }
    }

    /// Run an after-hook on a copy of the stored record.
    pub(crate) fn after_hook(
        &self,
        ctx: &Context,
        event: HookEvent,
        namespace: &Namespace,
        module: &Module,
        record: &Record,
        old: Option<&Record>,
    ) -> Option<String> {
        let mut seen = record.clone();
        let no_errors = ValueErrorSet::new();
        let outcome = self.hooks.invoke(
            ctx,
            HookPayload {
                event,
                namespace,
                module,
                record: &mut seen,
                old,
                errors: &no_errors,
                script: None,
            },
        );

        let message = match outcome {
            HookOutcome::Continue { errors } if errors.is_valid() => return None,
            HookOutcome::Continue { errors } => errors.to_string(),
            HookOutcome::SoftAbort => "aborted".to_string(),
            HookOutcome::Fail(message) => message,
        };
        tracing::warn!(event = %event, record_id = %record.id, error = %message, "after hook failed");
        Some(RecordError::hook_failed(event, message).to_string())
    }

    /// Audit a stored mutation and hand back the record.
    fn finish(
        &self,
        ctx: &Context,
        action: RecordAction,
        props: ActionProps,
        result: RecordResult<Applied>,
    ) -> RecordResult<Record> {
        match result {
            Ok(applied) => {
                let props = props.record(applied.record.id);
                self.audit
                    .record(ctx, action, props, applied.hook_error.as_deref());
                Ok(applied.record)
            }
            Err(err) => {
                self.audit_error(ctx, action, props, &err);
                Err(err)
            }
        }
    }

    pub(crate) fn audit_result<T>(
        &self,
        ctx: &Context,
        action: RecordAction,
        props: ActionProps,
        result: &RecordResult<T>,
    ) {
        match result {
            Ok(_) => self.audit.record(ctx, action, props, None),
            Err(err) => self.audit_error(ctx, action, props, err),
        }
    }

    pub(crate) fn audit_error(
        &self,
        ctx: &Context,
        action: RecordAction,
        props: ActionProps,
        err: &RecordError,
    ) {
        let props = match err.value_errors() {
            Some(errors) => props.value_errors(errors),
            None => props,
        };
        self.audit
            .record(ctx, action, props, Some(err.to_string().as_str()));
    }
}
