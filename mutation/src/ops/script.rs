//! Validation and manually triggered scripts.

use tessera_core::{Context, ModuleId, NamespaceId, Record, RecordId, RecordValueSet, ValueErrorSet};
use tessera_hooks::{HookEvent, HookOutcome, HookPayload};
use tessera_values::{check_structure, format_values, Sanitizer, Validator};

use crate::error::{RecordError, RecordResult};
use crate::ops::create::ensure_valid;
use crate::service::RecordService;

/// Sanitize and validate; findings are returned as data.
pub(crate) fn validate(
    svc: &RecordService,
    _ctx: &Context,
    record: &Record,
) -> RecordResult<ValueErrorSet> {
    let (_, module) = svc.load_module(record.namespace_id, record.module_id)?;

    check_structure(&module, &record.values)?;
    let values = Sanitizer::new().run(&module, &record.values);
    Ok(Validator::new(svc.store.as_ref()).run(&module, record.id, &values)?)
}

pub(crate) fn trigger(
    svc: &RecordService,
    ctx: &Context,
    namespace_id: NamespaceId,
    module_id: ModuleId,
    record_id: RecordId,
    values: RecordValueSet,
    script: &str,
) -> RecordResult<Record> {
    let (namespace, module) = svc.load_module(namespace_id, module_id)?;

    let old = if record_id.is_zero() {
        None
    } else {
        let (_, _, old) = svc.load_record(namespace_id, module_id, record_id)?;
        if !svc.access.can_read_record(ctx, &old) {
            return Err(RecordError::NotAllowedToRead(old.id));
        }
        Some(old)
    };

    check_structure(&module, &values)?;
    let values = Sanitizer::new().run(&module, &values);
    ensure_valid(Validator::new(svc.store.as_ref()).run(&module, record_id, &values)?)?;

    let mut record = old
        .clone()
        .unwrap_or_else(|| Record::new(namespace.id, module.id));
    record.values = values;

    let no_errors = ValueErrorSet::new();
    let outcome = svc.hooks.invoke(
        ctx,
        HookPayload {
            event: HookEvent::OnManual,
            namespace: &namespace,
            module: &module,
            record: &mut record,
            old: old.as_ref(),
            errors: &no_errors,
            script: Some(script),
        },
    );

    match outcome {
        HookOutcome::Continue { errors } => ensure_valid(errors)?,
        HookOutcome::SoftAbort => {
            return Err(RecordError::HookAborted {
                event: HookEvent::OnManual,
            })
        }
        HookOutcome::Fail(message) => {
            return Err(RecordError::hook_failed(HookEvent::OnManual, message))
        }
    }

    record.values = format_values(&module, &record.values);
    Ok(record)
}
