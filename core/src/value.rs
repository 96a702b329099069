//! Record values.
//!
//! A record stores its data as a set of named string values. Multi-value
//! fields carry several entries distinguished by `place`; the position of an
//! entry inside the set carries no meaning.

use crate::RecordId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single value of a record field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordValue {
    /// Owning record (zero until the record is stored).
    #[serde(default, skip_serializing_if = "RecordId::is_zero")]
    pub record_id: RecordId,
    /// Field name.
    pub name: String,
    /// Raw value.
    #[serde(default)]
    pub value: String,
    /// Slot within a multi-value field.
    #[serde(default)]
    pub place: u32,
    /// Resolved reference for reference-typed fields.
    #[serde(default, rename = "ref", skip_serializing_if = "is_zero")]
    pub reference: u64,
    /// Whether the caller changed this value.
    #[serde(skip)]
    pub updated: bool,
    /// Whether the value is scheduled for removal.
    #[serde(skip)]
    pub deleted: bool,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

impl RecordValue {
    /// Create a value at place 0.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    /// Set the place of this value.
    pub fn at(mut self, place: u32) -> Self {
        self.place = place;
        self
    }

    /// Set the owning record.
    pub fn for_record(mut self, record_id: RecordId) -> Self {
        self.record_id = record_id;
        self
    }

    /// Set the resolved reference.
    pub fn with_ref(mut self, reference: u64) -> Self {
        self.reference = reference;
        self
    }

    /// Returns true if the value carries no content.
    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty() && self.reference == 0
    }

    /// Returns true if both values occupy the same slot.
    pub fn same_slot(&self, other: &RecordValue) -> bool {
        self.name == other.name && self.place == other.place
    }
}

/// The set of values owned by one record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordValueSet(Vec<RecordValue>);

impl RecordValueSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RecordValue> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, RecordValue> {
        self.0.iter_mut()
    }

    /// Append a value without checking its slot.
    pub fn push(&mut self, value: RecordValue) {
        self.0.push(value);
    }

    /// Returns true if a value occupies (name, place).
    pub fn has(&self, name: &str, place: u32) -> bool {
        self.get(name, place).is_some()
    }

    /// Get the value at (name, place).
    pub fn get(&self, name: &str, place: u32) -> Option<&RecordValue> {
        self.0.iter().find(|v| v.name == name && v.place == place)
    }

    /// Get the first value of a field (lowest place).
    pub fn first(&self, name: &str) -> Option<&RecordValue> {
        self.0
            .iter()
            .filter(|v| v.name == name)
            .min_by_key(|v| v.place)
    }

    /// All values of one field, ordered by place.
    pub fn filter_by_name(&self, name: &str) -> RecordValueSet {
        let mut out: Vec<RecordValue> = self.0.iter().filter(|v| v.name == name).cloned().collect();
        out.sort_by_key(|v| v.place);
        RecordValueSet(out)
    }

    /// Names of all fields that carry at least one value.
    pub fn names(&self) -> HashSet<&str> {
        self.0.iter().map(|v| v.name.as_str()).collect()
    }

    /// Replace the value in the same slot, or append it.
    pub fn set(&mut self, value: RecordValue) {
        match self.0.iter_mut().find(|v| v.same_slot(&value)) {
            Some(existing) => *existing = value,
            None => self.0.push(value),
        }
    }

    /// Mark every value as updated (or not).
    pub fn set_updated_flag(&mut self, updated: bool) {
        for v in &mut self.0 {
            v.updated = updated;
        }
    }

    /// Keep only values matching the predicate.
    pub fn retain(&mut self, f: impl FnMut(&RecordValue) -> bool) {
        self.0.retain(f);
    }

    /// Drop deleted and empty values.
    pub fn get_clean(&self) -> RecordValueSet {
        RecordValueSet(
            self.0
                .iter()
                .filter(|v| !v.deleted && !v.is_empty())
                .cloned()
                .collect(),
        )
    }

    /// Canonical order: by field name, then place.
    pub fn sorted(mut self) -> RecordValueSet {
        self.0
            .sort_by(|a, b| a.name.cmp(&b.name).then(a.place.cmp(&b.place)));
        self
    }

    /// Returns true if both sets hold the same (place, value, ref) entries for a field.
    pub fn field_equals(&self, other: &RecordValueSet, name: &str) -> bool {
        let key = |set: &RecordValueSet| {
            let mut entries: Vec<(u32, String, u64)> = set
                .iter()
                .filter(|v| v.name == name && !v.deleted)
                .map(|v| (v.place, v.value.clone(), v.reference))
                .collect();
            entries.sort();
            entries
        };
        key(self) == key(other)
    }

    /// Merge `new` onto these (old) values, field by field.
    ///
    /// Fields the caller may not edit keep their old values untouched. For
    /// editable fields the submitted values replace the old ones: a value is
    /// flagged `updated` only when its content differs from the old value in the
    /// same slot, and old values without a submitted counterpart are flagged
    /// `deleted`. Values of fields not listed in `fields` are dropped.
    pub fn merge<'a>(
        &self,
        fields: impl IntoIterator<Item = &'a str>,
        new: &RecordValueSet,
        mut can_edit: impl FnMut(&str) -> bool,
    ) -> RecordValueSet {
        let mut out = RecordValueSet::new();

        for field in fields {
            let old_values = self.filter_by_name(field);

            if !can_edit(field) {
                for mut v in old_values.0 {
                    v.updated = false;
                    out.push(v);
                }
                continue;
            }

            let new_values = new.filter_by_name(field);
            for mut v in new_values.0.iter().cloned() {
                v.updated = match old_values.get(field, v.place) {
                    Some(old) => old.value != v.value || old.reference != v.reference,
                    None => true,
                };
                out.push(v);
            }

            for mut old in old_values.0 {
                if !new_values.has(field, old.place) {
                    old.deleted = true;
                    old.updated = true;
                    out.push(old);
                }
            }
        }

        out
    }
}

impl From<Vec<RecordValue>> for RecordValueSet {
    fn from(values: Vec<RecordValue>) -> Self {
        Self(values)
    }
}

impl FromIterator<RecordValue> for RecordValueSet {
    fn from_iter<T: IntoIterator<Item = RecordValue>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for RecordValueSet {
    type Item = RecordValue;
    type IntoIter = std::vec::IntoIter<RecordValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordValueSet {
    type Item = &'a RecordValue;
    type IntoIter = std::slice::Iter<'a, RecordValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Extend<RecordValue> for RecordValueSet {
    fn extend<T: IntoIterator<Item = RecordValue>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

/// Build a value set from `name => value` pairs.
///
/// ```
/// use tessera_core::values;
/// let vv = values! { "title" => "Hello", "tags" => ["a", "b"] };
/// assert_eq!(vv.len(), 3);
/// ```
#[macro_export]
macro_rules! values {
    (@push $set:ident, $name:expr, [$($item:expr),* $(,)?]) => {{
        let mut place = 0u32;
        $(
            $set.push($crate::RecordValue::new($name, $item).at(place));
            place += 1;
        )*
        let _ = place;
    }};
    (@push $set:ident, $name:expr, $value:expr) => {
        $set.push($crate::RecordValue::new($name, $value));
    };
    () => {
        $crate::RecordValueSet::new()
    };
    ($($name:expr => $value:tt),+ $(,)?) => {{
        let mut set = $crate::RecordValueSet::new();
        $( $crate::values!(@push set, $name, $value); )+
        set
    }};
}
