//! Tessera Access
//!
//! Record-level and field-level permission predicates:
//! - `AccessControl` - the predicate interface consumed by the record service
//! - `AllowAll` and the rule-driven `StaticAccessControl`
//! - Read-time redaction of unreadable fields
//! - The update check that turns denied field edits into `updateDenied` errors

mod control;
mod gate;
mod rules;

pub use control::{AccessControl, AllowAll};
pub use gate::{denied_updates, read_check, readable_fields, redact};
pub use rules::{Operation, Resource, StaticAccessControl};
