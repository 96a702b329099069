//! Tessera Core Types
//!
//! This crate provides the foundational types used throughout Tessera:
//! - Identity types (NamespaceId, ModuleId, RecordId, UserId) and ID generation
//! - Record values and value sets
//! - The Record structure with its audit fields
//! - Value errors (business-rule violations reported as data)
//! - Clocks and the execution context

mod context;
mod error;
mod id;
mod record;
mod time;
mod value;

pub use context::*;
pub use error::*;
pub use id::*;
pub use record::*;
pub use time::*;
pub use value::*;
