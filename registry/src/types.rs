//! Schema definition types.

use serde::{Deserialize, Serialize};
use tessera_core::{ModuleId, NamespaceId};

/// Namespace (tenant) definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub id: NamespaceId,
    pub slug: String,
    pub name: String,
    pub enabled: bool,
}

impl Namespace {
    pub fn new(id: NamespaceId, slug: impl Into<String>) -> Self {
        let slug = slug.into();
        Self {
            id,
            name: slug.clone(),
            slug,
            enabled: true,
        }
    }
}

/// Kind of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FieldKind {
    /// Single-line plain text.
    String,
    /// Multi-line plain text.
    Text,
    /// HTML content; only unsafe markup is removed.
    RichText,
    /// Decimal number with a fixed display precision.
    Number { precision: u8 },
    /// Boolean stored as "1" / "0".
    Bool,
    /// RFC 3339 timestamp, or a plain date when `only_date` is set.
    DateTime { only_date: bool },
    Email,
    Url,
    /// One of a fixed list of options.
    Select { options: Vec<String> },
    /// Reference to a record of another module.
    Record { module_id: ModuleId },
    /// Reference to a user.
    User,
    /// Reference to an attachment.
    File,
}

impl FieldKind {
    /// Returns true if values must resolve to another entity.
    pub fn is_ref(&self) -> bool {
        matches!(
            self,
            FieldKind::Record { .. } | FieldKind::User | FieldKind::File
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::Number { .. })
    }

    /// Returns true for kinds holding free-form text.
    pub fn is_text(&self) -> bool {
        matches!(self, FieldKind::String | FieldKind::Text | FieldKind::RichText)
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::String => "String",
            FieldKind::Text => "Text",
            FieldKind::RichText => "RichText",
            FieldKind::Number { .. } => "Number",
            FieldKind::Bool => "Bool",
            FieldKind::DateTime { .. } => "DateTime",
            FieldKind::Email => "Email",
            FieldKind::Url => "Url",
            FieldKind::Select { .. } => "Select",
            FieldKind::Record { .. } => "Record",
            FieldKind::User => "User",
            FieldKind::File => "File",
        }
    }
}

/// A default value for one place of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefault {
    pub value: String,
    pub place: u32,
}

/// Derived value recomputed from other fields of the same record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueExpr {
    /// A constant.
    Literal(String),
    /// First value of another field.
    Copy(String),
    /// First values of the listed fields joined by `separator` (empty ones skipped).
    Concat {
        fields: Vec<String>,
        separator: String,
    },
    /// Numeric sum of the first values of the listed fields (missing = 0).
    Sum(Vec<String>),
    /// Numeric product of the first values of the listed fields (missing = 1).
    Product(Vec<String>),
}

impl ValueExpr {
    /// Names of all fields the expression reads.
    pub fn inputs(&self) -> Vec<&str> {
        match self {
            ValueExpr::Literal(_) => Vec::new(),
            ValueExpr::Copy(f) => vec![f.as_str()],
            ValueExpr::Concat { fields, .. } | ValueExpr::Sum(fields) | ValueExpr::Product(fields) => {
                fields.iter().map(String::as_str).collect()
            }
        }
    }
}

/// Field definition within a module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    /// Value is a sequence instead of a scalar.
    pub multi: bool,
    pub required: bool,
    /// Value must be unique across records of the module.
    pub unique: bool,
    /// Minimum numeric value.
    pub min: Option<f64>,
    /// Maximum numeric value.
    pub max: Option<f64>,
    /// Regular expression every value must match.
    pub pattern: Option<String>,
    pub defaults: Vec<FieldDefault>,
    /// Derived value; the field is recomputed on every write.
    pub expression: Option<ValueExpr>,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            kind,
            multi: false,
            required: false,
            unique: false,
            min: None,
            max: None,
            pattern: None,
            defaults: Vec::new(),
            expression: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        // Merge rather than replace: only update if Some is provided
        if min.is_some() {
            self.min = min;
        }
        if max.is_some() {
            self.max = max;
        }
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Add a default for the next free place.
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        let place = self.defaults.len() as u32;
        self.defaults.push(FieldDefault {
            value: value.into(),
            place,
        });
        self
    }

    pub fn with_expression(mut self, expr: ValueExpr) -> Self {
        self.expression = Some(expr);
        self
    }

    pub fn is_ref(&self) -> bool {
        self.kind.is_ref()
    }

    pub fn is_numeric(&self) -> bool {
        self.kind.is_numeric()
    }

    /// Default declared for a place.
    pub fn default_at(&self, place: u32) -> Option<&FieldDefault> {
        self.defaults.iter().find(|d| d.place == place)
    }
}

/// Validation rule spanning more than one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CrossFieldRule {
    /// Numeric (or date) value of `lower` must not exceed `upper` when both are set.
    LessOrEqual { lower: String, upper: String },
    /// `field` must be set whenever `when` is set.
    RequiredWith { field: String, when: String },
}

impl CrossFieldRule {
    pub fn fields(&self) -> [&str; 2] {
        match self {
            CrossFieldRule::LessOrEqual { lower, upper } => [lower, upper],
            CrossFieldRule::RequiredWith { field, when } => [field, when],
        }
    }
}

/// Module (runtime schema) definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub namespace_id: NamespaceId,
    pub handle: String,
    pub name: String,
    /// Ordered field definitions; names are unique.
    pub fields: Vec<Field>,
    pub rules: Vec<CrossFieldRule>,
}

impl Module {
    /// Get a field definition by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check if this module has a field.
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Get all field names, in definition order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}
