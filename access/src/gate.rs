//! Helpers applying access control to values and result sets.

use std::collections::HashSet;
use std::sync::Arc;
use tessera_core::{Context, Record, RecordValueSet, ValueError, ValueErrorSet};
use tessera_registry::Module;
use tessera_store::RecordCheck;

use crate::AccessControl;

/// Names of the fields of `module` the caller may read.
pub fn readable_fields(ac: &dyn AccessControl, ctx: &Context, module: &Module) -> HashSet<String> {
    module
        .field_names()
        .filter(|name| ac.can_read_record_value(ctx, module, name))
        .map(str::to_string)
        .collect()
}

/// Remove every value whose field is not in `readable`.
pub fn redact(records: &mut [Record], readable: &HashSet<String>) {
    for record in records {
        record.values.retain(|v| readable.contains(&v.name));
    }
}

/// One `updateDenied` error per field the caller changes without the right to.
///
/// Without `old` (creation) a field counts as changed when any of its values
/// is flagged updated, i.e. differs from the field default. With `old`, a
/// field counts as changed when the submitted values differ from the stored
/// ones; resubmitting stored values unchanged, or omitting the field, is not
/// an edit. Only fields the module still defines are checked.
pub fn denied_updates(
    ac: &dyn AccessControl,
    ctx: &Context,
    module: &Module,
    old: Option<&RecordValueSet>,
    new: &RecordValueSet,
) -> ValueErrorSet {
    let mut errors = ValueErrorSet::new();

    for field in &module.fields {
        let submitted = new.filter_by_name(&field.name);
        if submitted.is_empty() {
            continue;
        }

        let attempted = match old {
            None => submitted.iter().find(|v| v.updated),
            Some(old) if !old.field_equals(&submitted, &field.name) => submitted.iter().next(),
            Some(_) => None,
        };

        if let Some(v) = attempted {
            if !ac.can_update_record_value(ctx, module, &field.name) {
                errors.push(ValueError::update_denied(&field.name, &v.value));
            }
        }
    }

    errors
}

/// Per-record read check to push down into a search.
pub fn read_check(ac: Arc<dyn AccessControl>, ctx: Context) -> RecordCheck {
    Arc::new(move |record: &Record| ac.can_read_record(&ctx, record))
}
