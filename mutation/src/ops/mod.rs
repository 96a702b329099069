//! Record operation implementations.
//!
//! Each module handles one kind of operation:
//! - `create` - creation and iterator clones
//! - `update` - updates with merge, staleness and field checks
//! - `delete` - soft deletion
//! - `lookup` - reads with XSS sanitization and redaction
//! - `script` - validation and manual script triggers

pub(crate) mod create;
pub(crate) mod delete;
pub(crate) mod lookup;
pub(crate) mod script;
pub(crate) mod update;
