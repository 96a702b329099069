//! Value errors.
//!
//! Business-rule violations on submitted values are reported as data: a
//! [`ValueErrorSet`] accumulates every finding of one pass and is "valid" only
//! when empty. Malformed callers are rejected through hard errors elsewhere.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

/// Kind tag of a value error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ValueErrorKind {
    /// Required value is missing.
    Empty,
    /// Value is not unique across records of the module.
    DuplicateValue,
    /// The same value appears twice in one multi-value field.
    DuplicateValueInSet,
    /// Referenced record does not exist.
    InvalidRecordReference,
    /// Referenced user does not exist.
    InvalidUserReference,
    /// Referenced attachment does not exist.
    InvalidAttachmentReference,
    /// Value does not parse or match the field's format/pattern.
    InvalidValue,
    /// Numeric value outside the allowed range.
    OutOfRange,
    /// Value is not one of the field's options.
    InvalidOption,
    /// Caller may not update the field.
    UpdateDenied,
    /// A derived value could not be computed.
    InvalidExpression,
    /// A rule spanning several fields failed.
    CrossField,
    /// Kind produced by an external hook.
    Other(String),
}

impl ValueErrorKind {
    pub fn as_str(&self) -> &str {
        match self {
            ValueErrorKind::Empty => "empty",
            ValueErrorKind::DuplicateValue => "duplicateValue",
            ValueErrorKind::DuplicateValueInSet => "duplicateValueInSet",
            ValueErrorKind::InvalidRecordReference => "invalidRecordReference",
            ValueErrorKind::InvalidUserReference => "invalidUserReference",
            ValueErrorKind::InvalidAttachmentReference => "invalidAttachmentReference",
            ValueErrorKind::InvalidValue => "invalidValue",
            ValueErrorKind::OutOfRange => "outOfRange",
            ValueErrorKind::InvalidOption => "invalidOption",
            ValueErrorKind::UpdateDenied => "updateDenied",
            ValueErrorKind::InvalidExpression => "invalidExpression",
            ValueErrorKind::CrossField => "crossField",
            ValueErrorKind::Other(kind) => kind,
        }
    }
}

impl From<String> for ValueErrorKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "empty" => ValueErrorKind::Empty,
            "duplicateValue" => ValueErrorKind::DuplicateValue,
            "duplicateValueInSet" => ValueErrorKind::DuplicateValueInSet,
            "invalidRecordReference" => ValueErrorKind::InvalidRecordReference,
            "invalidUserReference" => ValueErrorKind::InvalidUserReference,
            "invalidAttachmentReference" => ValueErrorKind::InvalidAttachmentReference,
            "invalidValue" => ValueErrorKind::InvalidValue,
            "outOfRange" => ValueErrorKind::OutOfRange,
            "invalidOption" => ValueErrorKind::InvalidOption,
            "updateDenied" => ValueErrorKind::UpdateDenied,
            "invalidExpression" => ValueErrorKind::InvalidExpression,
            "crossField" => ValueErrorKind::CrossField,
            _ => ValueErrorKind::Other(s),
        }
    }
}

impl From<ValueErrorKind> for String {
    fn from(kind: ValueErrorKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ValueErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One business-rule violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueError {
    /// Kind tag.
    pub kind: ValueErrorKind,
    /// Free-form metadata; always carries `field` when a field is involved.
    #[serde(default)]
    pub meta: BTreeMap<String, JsonValue>,
}

impl ValueError {
    pub fn new(kind: ValueErrorKind) -> Self {
        Self {
            kind,
            meta: BTreeMap::new(),
        }
    }

    /// Create an error for a field and the offending value.
    pub fn for_field(
        kind: ValueErrorKind,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::new(kind)
            .with_meta("field", field.into())
            .with_meta("value", value.into())
    }

    pub fn update_denied(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::for_field(ValueErrorKind::UpdateDenied, field, value)
    }

    /// Attach one metadata entry.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// The field this error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        self.meta.get("field").and_then(|v| v.as_str())
    }
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field() {
            Some(field) => write!(f, "{} ({})", self.kind, field),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Accumulated value errors of one record (or one batch).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueErrorSet(Vec<ValueError>);

impl ValueErrorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValueError) {
        self.0.push(error);
    }

    /// Append every error of another set.
    pub fn merge(&mut self, other: ValueErrorSet) {
        self.0.extend(other.0);
    }

    /// Valid means no errors were found.
    pub fn is_valid(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValueError> {
        self.0.iter()
    }

    /// Set one metadata entry on every error.
    pub fn tag_all(&mut self, key: &str, value: impl Into<JsonValue>) {
        let value = value.into();
        for e in &mut self.0 {
            e.meta.insert(key.to_string(), value.clone());
        }
    }

    /// Errors for one field.
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a ValueError> + 'a {
        self.0.iter().filter(move |e| e.field() == Some(field))
    }

    /// Count of errors of one kind.
    pub fn count_kind(&self, kind: &ValueErrorKind) -> usize {
        self.0.iter().filter(|e| &e.kind == kind).count()
    }
}

impl From<Vec<ValueError>> for ValueErrorSet {
    fn from(errors: Vec<ValueError>) -> Self {
        Self(errors)
    }
}

impl FromIterator<ValueError> for ValueErrorSet {
    fn from_iter<T: IntoIterator<Item = ValueError>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ValueErrorSet {
    type Item = ValueError;
    type IntoIter = std::vec::IntoIter<ValueError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ValueErrorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|e| e.to_string()).collect();
        write!(f, "{}", parts.join(", "))
    }
}
