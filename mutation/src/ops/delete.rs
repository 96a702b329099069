//! Soft deletion.

use tessera_core::{Context, ModuleId, NamespaceId, Record, RecordId, ValueErrorSet};
use tessera_hooks::{HookEvent, HookPayload};
use tessera_registry::Module;
use tessera_store::with_transaction;

use crate::error::{RecordError, RecordResult};
use crate::ops::create::ensure_valid;
use crate::service::{Applied, RecordService};

/// Mark a record deleted.
pub(crate) fn execute(
    svc: &RecordService,
    ctx: &Context,
    namespace_id: NamespaceId,
    module_id: ModuleId,
    record_id: RecordId,
) -> RecordResult<Applied> {
    let (namespace, module, old) = svc.load_record(namespace_id, module_id, record_id)?;

    if !svc.access.can_delete_record(ctx, &old) {
        return Err(RecordError::NotAllowedToDelete(old.id));
    }

    if svc.config.emit_events {
        let mut del = old.clone();
        let no_errors = ValueErrorSet::new();
        let found = svc.before_hook(
            ctx,
            HookPayload {
                event: HookEvent::BeforeDelete,
                namespace: &namespace,
                module: &module,
                record: &mut del,
                old: Some(&old),
                errors: &no_errors,
                script: None,
            },
        )?;
        ensure_valid(found)?;
    }

    let record = soft_delete(svc, ctx, &module, &old)?;

    let hook_error = if svc.config.emit_events {
        svc.after_hook(ctx, HookEvent::AfterDelete, &namespace, &module, &record, Some(&old))
    } else {
        None
    };

    tracing::debug!(record_id = %record.id, "record deleted");
    Ok(Applied { record, hook_error })
}

/// Stamp the deletion fields and store the record.
pub(crate) fn soft_delete(
    svc: &RecordService,
    ctx: &Context,
    module: &Module,
    old: &Record,
) -> RecordResult<Record> {
    let mut record = old.clone();
    record.deleted_at = Some(svc.now());
    record.deleted_by = ctx.invoker;

    with_transaction(svc.store.as_ref(), |tx| {
        tx.update_record(module, &record).map_err(RecordError::from)
    })?;
    Ok(record)
}
