//! Tessera Store
//!
//! The storage collaborator of the record service:
//! - `Store` / `StoreTx` - read and transactional write interfaces
//! - `with_transaction` - scoped acquisition that commits on success and
//!   rolls back on any error
//! - `RecordFilter` / `Filter` - typed, pushed-down search predicates
//! - `MemoryStore` - in-process implementation with undo-log rollback

mod error;
mod filter;
mod memory;
mod store;

pub use error::{StoreError, StoreResult};
pub use filter::{CmpOp, DeletedFilter, Filter, RecordCheck, RecordFilter, SortExpr};
pub use memory::MemoryStore;
pub use store::{with_transaction, Store, StoreTx};
