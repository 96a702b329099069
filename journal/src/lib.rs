//! Tessera Journal
//!
//! Audit trail of record operations.
//!
//! Responsibilities:
//! - Name every audited action with a stable tag
//! - Carry the action's properties (IDs, filters, errors)
//! - Record entries fire-and-forget: a recorder never fails the caller
//! - Keep entries in memory with sequence numbers, or emit them as tracing events

mod entry;
mod journal;

pub use entry::{ActionProps, AuditEntry, RecordAction, Seq};
pub use journal::{AuditRecorder, MemoryJournal, NullRecorder, TracingRecorder};
