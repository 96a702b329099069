//! Canonical formatting of values.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use tessera_core::{RecordValue, RecordValueSet};
use tessera_registry::{Field, FieldKind, Module};

/// Canonicalize values for hooks and API consumers.
///
/// Numbers are rendered with the field's precision and timestamps as RFC 3339
/// in UTC (dates only for date fields). Values that do not parse are left as
/// they are.
pub fn format_values(module: &Module, values: &RecordValueSet) -> RecordValueSet {
    values
        .iter()
        .map(|v| match module.field(&v.name) {
            Some(field) => format_value(field, v),
            None => v.clone(),
        })
        .collect()
}

/// Canonical form of one value of `field`.
pub(crate) fn format_value(field: &Field, v: &RecordValue) -> RecordValue {
    let mut v = v.clone();
    match &field.kind {
        FieldKind::Number { precision } => {
            if let Ok(n) = v.value.trim().parse::<f64>() {
                v.value = format!("{:.*}", usize::from(*precision), n);
            }
        }
        FieldKind::DateTime { only_date } => {
            if let Some(ts) = parse_datetime(&v.value) {
                v.value = if *only_date {
                    ts.format("%Y-%m-%d").to_string()
                } else {
                    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
                };
            }
        }
        _ => {}
    }
    v
}

/// Parse RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS` (taken as UTC) or a plain date.
pub(crate) fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for layout in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, layout) {
            return Some(ts.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ts| ts.and_utc())
}
