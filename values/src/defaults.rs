//! Default values.

use tessera_core::{RecordValue, RecordValueSet};
use tessera_registry::Module;

/// Fill every declared default whose (field, place) slot is still free.
///
/// Only creation and cloning apply defaults; updates never do.
pub fn apply_defaults(module: &Module, values: &mut RecordValueSet) {
    for field in &module.fields {
        for default in &field.defaults {
            if !values.has(&field.name, default.place) {
                values.push(RecordValue::new(&field.name, &default.value).at(default.place));
            }
        }
    }
}

/// Flag each value as updated unless it equals the field's default for its place.
pub fn mark_updated(module: &Module, values: &mut RecordValueSet) {
    for v in values.iter_mut() {
        let is_default = module
            .field(&v.name)
            .and_then(|f| f.default_at(v.place))
            .is_some_and(|d| d.value == v.value);
        v.updated = !is_default;
    }
}
