//! Record update.

use tessera_access::denied_updates;
use tessera_core::{Context, Record, ValueErrorSet};
use tessera_hooks::{HookEvent, HookPayload};
use tessera_registry::Module;
use tessera_store::with_transaction;
use tessera_values::{check_structure, format_values, Sanitizer};

use crate::error::{RecordError, RecordResult};
use crate::ops::create::ensure_valid;
use crate::service::{Applied, RecordService};

/// Update a record.
pub(crate) fn execute(svc: &RecordService, ctx: &Context, upd: Record) -> RecordResult<Applied> {
    if upd.id.is_zero() {
        return Err(RecordError::InvalidId);
    }

    let (namespace, module, old) = svc.load_record(upd.namespace_id, upd.module_id, upd.id)?;

    if !svc.access.can_update_record(ctx, &old) {
        return Err(RecordError::NotAllowedToUpdate(old.id));
    }

    if let Some(expected) = upd.updated_at {
        if expected != old.concurrency_stamp() {
            return Err(RecordError::stale_data(old.id));
        }
    }

    check_structure(&module, &upd.values)?;

    let mut record = upd;
    ensure_valid(prepare(svc, ctx, &module, &mut record, &old)?)?;

    if svc.config.emit_events {
        let no_errors = ValueErrorSet::new();
        let found = svc.before_hook(
            ctx,
            HookPayload {
                event: HookEvent::BeforeUpdate,
                namespace: &namespace,
                module: &module,
                record: &mut record,
                old: Some(&old),
                errors: &no_errors,
                script: None,
            },
        )?;
        ensure_valid(found)?;

        // Hook output goes through the same checks as caller input.
        ensure_valid(prepare(svc, ctx, &module, &mut record, &old)?)?;
    }

    with_transaction(svc.store.as_ref(), |tx| {
        tx.update_record(&module, &record).map_err(RecordError::from)
    })?;

    let hook_error = if svc.config.emit_events {
        svc.after_hook(ctx, HookEvent::AfterUpdate, &namespace, &module, &record, Some(&old))
    } else {
        None
    };

    tracing::debug!(record_id = %record.id, "record updated");
    Ok(Applied { record, hook_error })
}

/// Store the record as changed by an iteration hook.
pub(crate) fn apply_iteration(
    svc: &RecordService,
    ctx: &Context,
    module: &Module,
    old: &Record,
    changed: Record,
) -> RecordResult<Record> {
    let mut record = changed;
    ensure_valid(prepare(svc, ctx, module, &mut record, old)?)?;

    with_transaction(svc.store.as_ref(), |tx| {
        tx.update_record(module, &record).map_err(RecordError::from)
    })?;
    Ok(record)
}

/// One update pass: carry over immutable fields, check field rights, and
/// merge the submitted values onto the stored ones.
///
/// Edits to fields the caller may not update are reported as `updateDenied`;
/// the merge keeps the stored values of those fields either way.
fn prepare(
    svc: &RecordService,
    ctx: &Context,
    module: &Module,
    record: &mut Record,
    old: &Record,
) -> RecordResult<ValueErrorSet> {
    record.values.set_updated_flag(true);

    record.id = old.id;
    record.namespace_id = old.namespace_id;
    record.module_id = old.module_id;
    record.created_at = old.created_at;
    record.created_by = old.created_by;
    record.updated_at = Some(svc.now());
    record.updated_by = ctx.invoker;
    record.deleted_at = old.deleted_at;
    record.deleted_by = old.deleted_by;
    if record.owned_by.is_zero() {
        record.owned_by = if old.owned_by.is_zero() {
            ctx.invoker
        } else {
            old.owned_by
        };
    }

    // Compare in stored form so resubmitted values are not mistaken for edits.
    let submitted = format_values(module, &Sanitizer::new().run(module, &record.values));
    let denied = denied_updates(svc.access.as_ref(), ctx, module, Some(&old.values), &submitted);
    if !denied.is_valid() {
        return Ok(denied);
    }

    let access = svc.access.as_ref();
    let can_update = |field: &str| access.can_update_record_value(ctx, module, field);
    let prepared = svc
        .pipeline()
        .prepare_update(module, record.id, &old.values, &record.values, &can_update)?;
    if prepared.is_valid() {
        record.values = prepared.values;
    }
    Ok(prepared.errors)
}
