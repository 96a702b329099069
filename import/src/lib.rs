//! Tessera Import
//!
//! Progress bookkeeping for long-running imports:
//! - `ImportProgress` - append-only counters of one import session
//! - `FailLog` - failed row indexes compressed into ranges, plus an error
//!   message histogram
//! - `ImportSession` - column mapping and failure policy of an import

mod error;
mod progress;
mod session;

pub use error::{ImportError, ImportResult};
pub use progress::{ErrorIndex, FailLog, ImportProgress, RecordIndex, IMPORT_ERROR_MAX_INDEX_COUNT};
pub use session::{ImportSession, OnError};
