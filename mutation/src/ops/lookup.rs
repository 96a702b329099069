//! Reads.
//!
//! Values leave the service XSS-sanitized and redacted to the fields the
//! caller may read. Hooks never see redacted records.

use tessera_access::{read_check, readable_fields, redact};
use tessera_core::{Context, ModuleId, NamespaceId, Record, RecordId};
use tessera_registry::Module;
use tessera_store::RecordFilter;
use tessera_values::Sanitizer;

use crate::error::{RecordError, RecordResult};
use crate::service::RecordService;

pub(crate) fn find_by_id(
    svc: &RecordService,
    ctx: &Context,
    namespace_id: NamespaceId,
    module_id: ModuleId,
    record_id: RecordId,
) -> RecordResult<Record> {
    let (namespace, module, record) = svc.load_record(namespace_id, module_id, record_id)?;

    if !svc.access.can_read_namespace(ctx, &namespace) {
        return Err(RecordError::NamespaceNotReadable(namespace.id));
    }
    if !svc.access.can_read_record(ctx, &record) {
        return Err(RecordError::NotAllowedToRead(record.id));
    }

    let mut records = vec![record];
    present(svc, ctx, &module, &mut records);
    records.pop().ok_or(RecordError::NotFound(record_id))
}

pub(crate) fn find(
    svc: &RecordService,
    ctx: &Context,
    filter: RecordFilter,
) -> RecordResult<(Vec<Record>, RecordFilter)> {
    let (namespace, module) = svc.load_module(filter.namespace_id, filter.module_id)?;

    if !svc.access.can_read_namespace(ctx, &namespace) {
        return Err(RecordError::NamespaceNotReadable(namespace.id));
    }
    if !svc.access.can_search_records_on_module(ctx, &module) {
        return Err(RecordError::NotAllowedToSearch(module.id));
    }

    let filter = filter.with_check(read_check(svc.access.clone(), ctx.clone()));
    let (mut records, resolved) = svc.store.search_records(&module, &filter)?;
    present(svc, ctx, &module, &mut records);
    Ok((records, resolved))
}

fn present(svc: &RecordService, ctx: &Context, module: &Module, records: &mut [Record]) {
    let sanitizer = Sanitizer::new();
    for record in records.iter_mut() {
        record.values = sanitizer.run_xss(module, &record.values);
    }
    redact(records, &readable_fields(svc.access.as_ref(), ctx, module));
}
