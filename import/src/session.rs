//! Import session settings.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use tessera_core::{ModuleId, NamespaceId, RecordValue, RecordValueSet, UserId};

use crate::error::{ImportError, ImportResult};
use crate::ImportProgress;

/// What to do when a row fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OnError {
    /// Count the failure and continue with the next row.
    #[default]
    Skip,
    /// Stop the import at the first failure.
    Fail,
}

impl FromStr for OnError {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(OnError::Skip),
            "fail" => Ok(OnError::Fail),
            _ => Err(ImportError::UnknownPolicy(s.to_string())),
        }
    }
}

/// One import into a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSession {
    pub namespace_id: NamespaceId,
    pub module_id: ModuleId,
    /// Source column name to field name.
    pub fields: BTreeMap<String, String>,
    pub on_error: OnError,
    /// Owner of the imported records; the invoker when unset.
    #[serde(default)]
    pub owned_by: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<ImportProgress>,
}

impl ImportSession {
    pub fn new(namespace_id: NamespaceId, module_id: ModuleId) -> Self {
        Self {
            namespace_id,
            module_id,
            fields: BTreeMap::new(),
            on_error: OnError::default(),
            owned_by: UserId::default(),
            progress: None,
        }
    }

    /// Map a source column onto a field.
    pub fn map(mut self, column: impl Into<String>, field: impl Into<String>) -> Self {
        self.fields.insert(column.into(), field.into());
        self
    }

    pub fn on_error(mut self, on_error: OnError) -> Self {
        self.on_error = on_error;
        self
    }

    /// Check the mapping against the module.
    ///
    /// `multi` returns whether a field takes several values, or `None` for an
    /// unknown field. A single-value field may be fed by one column only.
    pub fn check_fields(&self, multi: impl Fn(&str) -> Option<bool>) -> ImportResult<()> {
        let mut single: BTreeMap<&str, &str> = BTreeMap::new();

        for (column, field) in &self.fields {
            match multi(field.as_str()) {
                None => return Err(ImportError::unknown_field(column, field)),
                Some(true) => {}
                Some(false) => {
                    if let Some(first) = single.insert(field.as_str(), column.as_str()) {
                        return Err(ImportError::DuplicateField {
                            field: field.clone(),
                            first: first.to_string(),
                            second: column.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Values of one source row; unmapped columns and blank cells are ignored.
    ///
    /// Columns mapped to the same field fill consecutive places.
    pub fn map_row(&self, row: &BTreeMap<String, String>) -> RecordValueSet {
        let mut places: BTreeMap<&str, u32> = BTreeMap::new();

        self.fields
            .iter()
            .filter_map(|(column, field)| {
                let cell = row.get(column).filter(|cell| !cell.trim().is_empty())?;
                let place = places.entry(field.as_str()).or_default();
                let value = RecordValue::new(field, cell).at(*place);
                *place += 1;
                Some(value)
            })
            .collect()
    }
}
