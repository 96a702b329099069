//! Value validation.
//!
//! Every rule runs over every value; findings accumulate in one
//! `ValueErrorSet`. Only collaborator failures abort the pass.

use regex_lite::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use tessera_core::{RecordId, RecordValue, RecordValueSet, ValueError, ValueErrorKind, ValueErrorSet};
use tessera_registry::{CrossFieldRule, Field, FieldKind, Module};
use tessera_store::Store;

use crate::error::ValuesResult;
use crate::formatter::{format_value, parse_datetime};

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static URL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("regex literal compiles"))
}

fn url_regex() -> &'static Regex {
    URL_RE.get_or_init(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("regex literal compiles"))
}

/// Validates record values against a module, using the store for
/// uniqueness and reference checks.
pub struct Validator<'a> {
    store: &'a dyn Store,
}

impl<'a> Validator<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Run all field and cross-field rules.
    ///
    /// `record_id` identifies the record being written so that uniqueness
    /// checks do not collide with its own stored values.
    pub fn run(
        &self,
        module: &Module,
        record_id: RecordId,
        values: &RecordValueSet,
    ) -> ValuesResult<ValueErrorSet> {
        let mut errors = ValueErrorSet::new();

        for field in &module.fields {
            let field_values: Vec<&RecordValue> = values
                .iter()
                .filter(|v| v.name == field.name && !v.deleted && !v.is_empty())
                .collect();

            if field.required && field_values.is_empty() {
                errors.push(ValueError::for_field(ValueErrorKind::Empty, &field.name, ""));
                continue;
            }

            let mut seen = HashSet::new();
            for v in field_values {
                if field.multi && !seen.insert((v.value.as_str(), v.reference)) {
                    errors.push(ValueError::for_field(
                        ValueErrorKind::DuplicateValueInSet,
                        &field.name,
                        &v.value,
                    ));
                    continue;
                }
                self.check_value(module, record_id, field, v, &mut errors)?;
            }
        }

        for rule in &module.rules {
            check_rule(rule, values, &mut errors);
        }

        Ok(errors)
    }

    fn check_value(
        &self,
        module: &Module,
        record_id: RecordId,
        field: &Field,
        v: &RecordValue,
        errors: &mut ValueErrorSet,
    ) -> ValuesResult<()> {
        let value = v.value.trim();
        let invalid = |kind| ValueError::for_field(kind, &field.name, value);

        match &field.kind {
            FieldKind::Number { .. } => match value.parse::<f64>() {
                Ok(n) if n.is_finite() => {
                    if let Some(err) = check_range(field, n) {
                        errors.push(err);
                    }
                }
                _ => errors.push(invalid(ValueErrorKind::InvalidValue)),
            },
            FieldKind::Bool => {
                if value != "0" && value != "1" {
                    errors.push(invalid(ValueErrorKind::InvalidValue));
                }
            }
            FieldKind::DateTime { .. } => {
                if parse_datetime(value).is_none() {
                    errors.push(invalid(ValueErrorKind::InvalidValue));
                }
            }
            FieldKind::Email => {
                if !email_regex().is_match(value) {
                    errors.push(invalid(ValueErrorKind::InvalidValue));
                }
            }
            FieldKind::Url => {
                if !url_regex().is_match(value) {
                    errors.push(invalid(ValueErrorKind::InvalidValue));
                }
            }
            FieldKind::Select { options } => {
                if !options.iter().any(|o| o == value) {
                    errors.push(invalid(ValueErrorKind::InvalidOption));
                }
            }
            FieldKind::Record { module_id } => {
                if !self.record_exists(*module_id, v.reference)? {
                    errors.push(invalid(ValueErrorKind::InvalidRecordReference));
                }
            }
            FieldKind::User => {
                if !self.store.user_exists(v.reference.into())? {
                    errors.push(invalid(ValueErrorKind::InvalidUserReference));
                }
            }
            FieldKind::File => {
                if !self.store.attachment_exists(v.reference)? {
                    errors.push(invalid(ValueErrorKind::InvalidAttachmentReference));
                }
            }
            FieldKind::String | FieldKind::Text | FieldKind::RichText => {}
        }

        if let Some(pattern) = &field.pattern {
            let matched = Regex::new(pattern).map(|re| re.is_match(value)).unwrap_or(false);
            if !matched {
                errors.push(invalid(ValueErrorKind::InvalidValue).with_meta("pattern", pattern.as_str()));
            }
        }

        if field.unique {
            // Stored values are formatted.
            let candidate = format_value(field, v);
            if let Some(owner) = self.store.lookup_record_by_value(module, &field.name, &candidate)? {
                if owner != record_id {
                    errors.push(invalid(ValueErrorKind::DuplicateValue));
                }
            }
        }

        Ok(())
    }

    fn record_exists(&self, module_id: tessera_core::ModuleId, reference: u64) -> ValuesResult<bool> {
        if reference == 0 {
            return Ok(false);
        }
        let module = match self.store.lookup_module(module_id) {
            Ok(m) => m,
            Err(e) if e.is_not_found() => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        match self.store.lookup_record(&module, RecordId::new(reference)) {
            Ok(r) => Ok(!r.is_deleted()),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn check_range(field: &Field, n: f64) -> Option<ValueError> {
    let below = field.min.is_some_and(|min| n < min);
    let above = field.max.is_some_and(|max| n > max);
    if !below && !above {
        return None;
    }

    let mut err = ValueError::for_field(ValueErrorKind::OutOfRange, &field.name, n.to_string());
    if let Some(min) = field.min {
        err = err.with_meta("min", min);
    }
    if let Some(max) = field.max {
        err = err.with_meta("max", max);
    }
    Some(err)
}

fn check_rule(rule: &CrossFieldRule, values: &RecordValueSet, errors: &mut ValueErrorSet) {
    let present = |name: &str| {
        values
            .first(name)
            .filter(|v| !v.deleted && !v.is_empty())
            .map(|v| v.value.trim().to_string())
    };

    match rule {
        CrossFieldRule::LessOrEqual { lower, upper } => {
            let (Some(lo), Some(hi)) = (present(lower.as_str()), present(upper.as_str())) else {
                return;
            };
            let violated = match (lo.parse::<f64>(), hi.parse::<f64>()) {
                (Ok(a), Ok(b)) => a > b,
                _ => match (parse_datetime(&lo), parse_datetime(&hi)) {
                    (Some(a), Some(b)) => a > b,
                    _ => false,
                },
            };
            if violated {
                errors.push(
                    ValueError::for_field(ValueErrorKind::CrossField, lower.as_str(), lo)
                        .with_meta("rule", "lessOrEqual")
                        .with_meta("other", upper.as_str()),
                );
            }
        }
        CrossFieldRule::RequiredWith { field, when } => {
            if present(when.as_str()).is_some() && present(field.as_str()).is_none() {
                errors.push(
                    ValueError::for_field(ValueErrorKind::CrossField, field.as_str(), "")
                        .with_meta("rule", "requiredWith")
                        .with_meta("other", when.as_str()),
                );
            }
        }
    }
}
