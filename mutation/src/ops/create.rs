//! Record creation.

use chrono::{DateTime, Utc};
use tessera_access::denied_updates;
use tessera_core::{Context, Record, RecordId, ValueErrorSet};
use tessera_hooks::{HookEvent, HookPayload};
use tessera_registry::Module;
use tessera_store::with_transaction;
use tessera_values::{apply_defaults, check_structure, mark_updated};

use crate::error::{RecordError, RecordResult};
use crate::service::{Applied, RecordService};

/// Create a record.
pub(crate) fn execute(svc: &RecordService, ctx: &Context, new: Record) -> RecordResult<Applied> {
    let (namespace, module) = svc.load_module(new.namespace_id, new.module_id)?;

    if !svc.access.can_create_record_on_module(ctx, &module) {
        return Err(RecordError::NotAllowedToCreate(module.id));
    }

    check_structure(&module, &new.values)?;

    let mut record = new;
    let identity = (svc.ids.next_record_id(), svc.now());

    if svc.config.emit_events {
        ensure_valid(prepare(svc, ctx, &module, &mut record, identity)?)?;

        let no_errors = ValueErrorSet::new();
        let found = svc.before_hook(
            ctx,
            HookPayload {
                event: HookEvent::BeforeCreate,
                namespace: &namespace,
                module: &module,
                record: &mut record,
                old: None,
                errors: &no_errors,
                script: None,
            },
        )?;
        ensure_valid(found)?;
    }

    apply_defaults(&module, &mut record.values);

    // Hook output goes through the same checks as caller input.
    ensure_valid(prepare(svc, ctx, &module, &mut record, identity)?)?;

    with_transaction(svc.store.as_ref(), |tx| {
        tx.create_record(&module, &record).map_err(RecordError::from)
    })?;

    let hook_error = if svc.config.emit_events {
        svc.after_hook(ctx, HookEvent::AfterCreate, &namespace, &module, &record, None)
    } else {
        None
    };

    tracing::debug!(record_id = %record.id, values = record.values.len(), "record created");
    Ok(Applied { record, hook_error })
}

/// Store a copy of `source` as a new record, with defaults filled in.
pub(crate) fn clone_record(
    svc: &RecordService,
    ctx: &Context,
    module: &Module,
    source: Record,
) -> RecordResult<Record> {
    let mut record = source;
    let identity = (svc.ids.next_record_id(), svc.now());

    apply_defaults(module, &mut record.values);
    ensure_valid(prepare(svc, ctx, module, &mut record, identity)?)?;

    with_transaction(svc.store.as_ref(), |tx| {
        tx.create_record(module, &record).map_err(RecordError::from)
    })?;
    Ok(record)
}

/// One creation pass: reset identity and audit fields, check field rights,
/// and run the value pipeline.
///
/// On success the record carries the prepared values; the returned set holds
/// the findings otherwise.
fn prepare(
    svc: &RecordService,
    ctx: &Context,
    module: &Module,
    record: &mut Record,
    (id, created_at): (RecordId, DateTime<Utc>),
) -> RecordResult<ValueErrorSet> {
    mark_updated(module, &mut record.values);

    record.id = id;
    record.namespace_id = module.namespace_id;
    record.module_id = module.id;
    record.created_at = created_at;
    record.created_by = ctx.invoker;
    record.updated_at = None;
    record.updated_by = Default::default();
    record.deleted_at = None;
    record.deleted_by = Default::default();
    if record.owned_by.is_zero() {
        record.owned_by = ctx.invoker;
    }

    let denied = denied_updates(svc.access.as_ref(), ctx, module, None, &record.values);
    if !denied.is_valid() {
        return Ok(denied);
    }

    let prepared = svc.pipeline().prepare(module, record.id, &record.values)?;
    if prepared.is_valid() {
        record.values = prepared.values;
    }
    Ok(prepared.errors)
}

pub(crate) fn ensure_valid(errors: ValueErrorSet) -> RecordResult<()> {
    if errors.is_valid() {
        Ok(())
    } else {
        Err(RecordError::ValueInput(errors))
    }
}
