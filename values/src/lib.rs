//! Tessera Values
//!
//! The value pipeline turns a partially trusted value set into clean,
//! schema-valid values:
//! - Structural sanitization (hard errors for malformed callers)
//! - Content sanitization, with an XSS-only variant for read paths
//! - Merge onto prior values, honoring per-field update rights
//! - Derived-value expressions
//! - Validation, accumulating every finding into a `ValueErrorSet`
//! - Cleanup and formatting
//!
//! Defaulting lives next to the pipeline but is applied by the caller, since
//! only creation (and cloning) may add defaults.

mod defaults;
mod error;
mod expression;
mod formatter;
mod pipeline;
mod sanitize;
mod validator;

pub use defaults::{apply_defaults, mark_updated};
pub use error::{ValuesError, ValuesResult};
pub use expression::evaluate_expressions;
pub use formatter::format_values;
pub use pipeline::{Pipeline, Prepared};
pub use sanitize::{check_structure, is_ref_format, Sanitizer};
pub use validator::Validator;
