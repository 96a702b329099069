//! Structural and content sanitization.

use ammonia::Builder;
use std::collections::{HashMap, HashSet};
use tessera_core::{RecordValue, RecordValueSet};
use tessera_registry::{FieldKind, Module};

use crate::error::{ValuesError, ValuesResult};

/// Markup kept in rich text on write.
const RICH_TEXT_TAGS: &[&str] = &[
    "a", "b", "blockquote", "br", "code", "em", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "i",
    "li", "ol", "p", "pre", "s", "span", "strong", "sub", "sup", "u", "ul",
];

const MAX_CLEAN_PASSES: usize = 4;

/// Elements dropped together with their content.
const ACTIVE_TAGS: &[&str] = &["script", "style", "iframe", "object", "embed"];

fn active_tags() -> HashSet<&'static str> {
    ACTIVE_TAGS.iter().copied().collect()
}

/// No markup at all; text is kept escaped.
fn plain_policy() -> Builder<'static> {
    let mut builder = Builder::empty();
    builder.clean_content_tags(active_tags()).link_rel(None);
    builder
}

/// Formatting markup and plain links.
fn rich_text_policy() -> Builder<'static> {
    let mut builder = Builder::empty();
    builder
        .add_tags(RICH_TEXT_TAGS)
        .add_tag_attributes("a", &["href", "title"])
        .add_url_schemes(&["http", "https", "mailto"])
        .clean_content_tags(active_tags())
        .link_rel(None);
    builder
}

/// Ammonia's default allow-list, used on values shown back to readers.
fn display_policy() -> Builder<'static> {
    let mut builder = Builder::default();
    builder.link_rel(None);
    builder
}

/// Check the shape of a raw payload against the module.
///
/// Every value must name a known field, single-value fields carry at most one
/// value and reference values are empty, `0` or a positive integer.
pub fn check_structure(module: &Module, values: &RecordValueSet) -> ValuesResult<()> {
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for v in values {
        let field = module
            .field(&v.name)
            .ok_or_else(|| ValuesError::field_not_found(&v.name))?;

        let count = counts.entry(field.name.as_str()).or_default();
        *count += 1;
        if !field.multi && *count > 1 {
            return Err(ValuesError::invalid_value_structure(&field.name));
        }

        if field.is_ref() && !is_ref_format(&v.value) {
            return Err(ValuesError::invalid_reference_format(&field.name, &v.value));
        }
    }

    Ok(())
}

/// Returns true if `value` is acceptable as a raw reference.
pub fn is_ref_format(value: &str) -> bool {
    let v = value.trim();
    if v.is_empty() || v == "0" {
        return true;
    }
    v.starts_with(|c: char| matches!(c, '1'..='9')) && v.chars().all(|c| c.is_ascii_digit())
}

/// Content sanitizer.
///
/// `run` is the full variant applied before writing; `run_xss` only removes
/// active content and is used on values displayed back to readers.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sanitizer;

impl Sanitizer {
    pub fn new() -> Self {
        Self
    }

    /// Full sanitization, per field kind.
    pub fn run(&self, module: &Module, values: &RecordValueSet) -> RecordValueSet {
        values
            .iter()
            .map(|v| match module.field(&v.name) {
                Some(field) => sanitize_value(&field.kind, v.clone()),
                None => v.clone(),
            })
            .collect()
    }

    /// Remove scripts, event handlers and script URLs from text values.
    pub fn run_xss(&self, module: &Module, values: &RecordValueSet) -> RecordValueSet {
        let policy = display_policy();
        values
            .iter()
            .map(|v| {
                let mut v = v.clone();
                if module.field(&v.name).is_some_and(|f| f.kind.is_text()) {
                    v.value = policy.clean(&v.value).to_string();
                }
                v
            })
            .collect()
    }
}

fn sanitize_value(kind: &FieldKind, mut v: RecordValue) -> RecordValue {
    match kind {
        FieldKind::RichText => {
            v.value = clean(&rich_text_policy(), &v.value);
        }
        FieldKind::String
        | FieldKind::Text
        | FieldKind::Email
        | FieldKind::Url
        | FieldKind::Select { .. } => {
            v.value = clean(&plain_policy(), &v.value);
        }
        FieldKind::Number { .. } => {
            let trimmed = v.value.trim();
            v.value = trimmed.strip_prefix('+').unwrap_or(trimmed).to_string();
        }
        FieldKind::Bool => {
            v.value = normalize_bool(&v.value);
        }
        FieldKind::DateTime { .. } => {
            v.value = v.value.trim().to_string();
        }
        FieldKind::Record { .. } | FieldKind::User | FieldKind::File => {
            let raw = v.value.trim().to_string();
            match raw.parse::<u64>() {
                Ok(0) => {
                    v.value = String::new();
                    v.reference = 0;
                }
                Ok(id) => {
                    v.value = raw;
                    v.reference = id;
                }
                Err(_) if raw.is_empty() && v.reference != 0 => {
                    v.value = v.reference.to_string();
                }
                Err(_) => v.value = raw,
            }
        }
    }
    v
}

/// Clean until the output is stable, so a cleaned value cleans to itself.
fn clean(policy: &Builder<'_>, value: &str) -> String {
    let mut current = value.trim().to_string();
    for _ in 0..MAX_CLEAN_PASSES {
        let next = policy.clean(&current).to_string().trim().to_string();
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn normalize_bool(value: &str) -> String {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => "1".to_string(),
        "" | "0" | "false" | "no" | "off" => "0".to_string(),
        other => other.to_string(),
    }
}
