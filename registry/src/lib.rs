//! Tessera Registry
//!
//! Runtime schema lookup. Modules (record shapes) and their fields are
//! defined at runtime per namespace; the registry resolves them by ID and is
//! passed explicitly through every pipeline stage.

mod builder;
mod registry;
mod types;

pub use builder::{ModuleBuilder, RegistryError};
pub use registry::Registry;
pub use types::*;
