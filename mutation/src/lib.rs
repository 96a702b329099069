//! Tessera Mutation
//!
//! Create, update, delete and read records of dynamically defined modules.
//!
//! Responsibilities:
//! - Run submitted values through the value pipeline (sanitize, defaults,
//!   expressions, format, validate)
//! - Enforce module, record and field permissions
//! - Invoke before/after hooks and re-check their edits
//! - Persist inside store transactions and audit every operation
//! - Coordinate batches: bulk operations, reordering, iteration and imports
//!
//! # Module Structure
//!
//! - `service` - `RecordService`, collaborators and shared helpers
//! - `ops/` - Single-record operations (create, update, delete, lookup, script)
//! - `bulk` - Ordered create/update/delete batches with link-by
//! - `reorder` - Transactional position shifting
//! - `iterator` - Filtered walks with per-record hooks and actions
//! - `import` - Row imports with progress bookkeeping
//! - `config` - Service settings and their environment overrides
//! - `error` - Error types for record operations

mod bulk;
mod config;
mod error;
mod import;
mod iterator;
mod ops;
mod reorder;
mod service;

#[cfg(test)]
mod testing;

pub use bulk::{BulkKind, BulkOperation, BulkOutcome};
pub use config::{ConfigError, ServiceConfig};
pub use error::{RecordError, RecordResult};
pub use iterator::{IterationSummary, IteratorAction};
pub use reorder::OrganizeRequest;
pub use service::RecordService;
