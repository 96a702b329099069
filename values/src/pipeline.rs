//! The value pipeline.

use tessera_core::{RecordId, RecordValueSet, ValueErrorSet};
use tessera_registry::Module;
use tessera_store::Store;

use crate::error::ValuesResult;
use crate::expression::evaluate_expressions;
use crate::formatter::format_values;
use crate::sanitize::{check_structure, Sanitizer};
use crate::validator::Validator;

/// Output of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Prepared {
    /// Clean, formatted values when `errors` is empty; otherwise the values
    /// as they were when the failing stage ran.
    pub values: RecordValueSet,
    pub errors: ValueErrorSet,
}

impl Prepared {
    pub fn is_valid(&self) -> bool {
        self.errors.is_valid()
    }
}

/// Sanitize, merge, derive, validate, clean up and format record values.
///
/// Stages run in that order and stop at the first stage that reports value
/// errors. Running the pipeline on its own valid output yields the same
/// values.
pub struct Pipeline<'a> {
    store: &'a dyn Store,
    sanitizer: Sanitizer,
}

impl<'a> Pipeline<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self {
            store,
            sanitizer: Sanitizer::new(),
        }
    }

    /// Prepare values of a record without prior state.
    pub fn prepare(
        &self,
        module: &Module,
        record_id: RecordId,
        new: &RecordValueSet,
    ) -> ValuesResult<Prepared> {
        self.run(module, record_id, None, new, &|_| true)
    }

    /// Prepare values merged onto `old`.
    ///
    /// Fields for which `can_update` is false keep their old values; edits to
    /// them are dropped here and reported by the caller's update check.
    pub fn prepare_update(
        &self,
        module: &Module,
        record_id: RecordId,
        old: &RecordValueSet,
        new: &RecordValueSet,
        can_update: &dyn Fn(&str) -> bool,
    ) -> ValuesResult<Prepared> {
        self.run(module, record_id, Some(old), new, can_update)
    }

    fn run(
        &self,
        module: &Module,
        record_id: RecordId,
        old: Option<&RecordValueSet>,
        new: &RecordValueSet,
        can_update: &dyn Fn(&str) -> bool,
    ) -> ValuesResult<Prepared> {
        check_structure(module, new)?;

        let sanitized = self.sanitizer.run(module, new);

        let mut values = match old {
            Some(old) => old.merge(module.field_names(), &sanitized, can_update),
            None => sanitized,
        };

        let errors = evaluate_expressions(module, &mut values);
        if !errors.is_valid() {
            return Ok(Prepared { values, errors });
        }

        let errors = Validator::new(self.store).run(module, record_id, &values)?;
        if !errors.is_valid() {
            return Ok(Prepared { values, errors });
        }

        let values = format_values(module, &values.get_clean());
        tracing::trace!(module = %module.handle, values = values.len(), "values prepared");

        Ok(Prepared {
            values,
            errors: ValueErrorSet::new(),
        })
    }
}
