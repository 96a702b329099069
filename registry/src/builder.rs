//! ModuleBuilder for constructing a validated Module.

use crate::{CrossFieldRule, Field, Module};
use std::collections::HashSet;
use tessera_core::{ModuleId, NamespaceId};
use thiserror::Error;

/// Errors that can occur during module construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Duplicate field name: {0}")]
    DuplicateFieldName(String),

    #[error("Field {field} declares {count} defaults but is not multi-value")]
    TooManyDefaults { field: String, count: usize },

    #[error("Field {field} declares two defaults for place {place}")]
    DuplicateDefaultPlace { field: String, place: u32 },

    #[error("Invalid pattern on field {field}: {message}")]
    InvalidPattern { field: String, message: String },

    #[error("Unknown field {field} referenced by {context}")]
    UnknownField { field: String, context: String },

    #[error("Module not found: {0}")]
    ModuleNotFound(ModuleId),

    #[error("Namespace not found: {0}")]
    NamespaceNotFound(NamespaceId),
}

impl RegistryError {
    pub fn unknown_field(field: impl Into<String>, context: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
            context: context.into(),
        }
    }
}

/// Builder for constructing a Module.
#[derive(Debug)]
pub struct ModuleBuilder {
    id: ModuleId,
    namespace_id: NamespaceId,
    handle: String,
    name: Option<String>,
    fields: Vec<Field>,
    rules: Vec<CrossFieldRule>,
}

impl ModuleBuilder {
    /// Create a new builder.
    pub fn new(namespace_id: NamespaceId, id: ModuleId, handle: impl Into<String>) -> Self {
        Self {
            id,
            namespace_id,
            handle: handle.into(),
            name: None,
            fields: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a field definition.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a cross-field validation rule.
    pub fn rule(mut self, rule: CrossFieldRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Validate and build the module.
    pub fn build(self) -> Result<Module, RegistryError> {
        let mut names = HashSet::new();
        for field in &self.fields {
            if !names.insert(field.name.as_str()) {
                return Err(RegistryError::DuplicateFieldName(field.name.clone()));
            }
            check_defaults(field)?;
            if let Some(pattern) = &field.pattern {
                regex_lite::Regex::new(pattern).map_err(|e| RegistryError::InvalidPattern {
                    field: field.name.clone(),
                    message: e.to_string(),
                })?;
            }
        }

        for field in &self.fields {
            if let Some(expr) = &field.expression {
                for input in expr.inputs() {
                    if !names.contains(input) {
                        return Err(RegistryError::unknown_field(
                            input,
                            format!("expression of {}", field.name),
                        ));
                    }
                }
            }
        }

        for rule in &self.rules {
            for name in rule.fields() {
                if !names.contains(name) {
                    return Err(RegistryError::unknown_field(name, "cross-field rule"));
                }
            }
        }

        Ok(Module {
            id: self.id,
            namespace_id: self.namespace_id,
            name: self.name.unwrap_or_else(|| self.handle.clone()),
            handle: self.handle,
            fields: self.fields,
            rules: self.rules,
        })
    }
}

fn check_defaults(field: &Field) -> Result<(), RegistryError> {
    if !field.multi && field.defaults.len() > 1 {
        return Err(RegistryError::TooManyDefaults {
            field: field.name.clone(),
            count: field.defaults.len(),
        });
    }
    let mut places = HashSet::new();
    for d in &field.defaults {
        if !places.insert(d.place) {
            return Err(RegistryError::DuplicateDefaultPlace {
                field: field.name.clone(),
                place: d.place,
            });
        }
    }
    Ok(())
}
