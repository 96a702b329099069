//! The access control interface.

use tessera_core::{Context, Record};
use tessera_registry::{Module, Namespace};

/// Permission predicates evaluated for the caller in `ctx`.
pub trait AccessControl: Send + Sync {
    fn can_read_namespace(&self, ctx: &Context, namespace: &Namespace) -> bool;

    fn can_read_module(&self, ctx: &Context, module: &Module) -> bool;

    fn can_create_record_on_module(&self, ctx: &Context, module: &Module) -> bool;

    fn can_search_records_on_module(&self, ctx: &Context, module: &Module) -> bool;

    fn can_read_record(&self, ctx: &Context, record: &Record) -> bool;

    fn can_update_record(&self, ctx: &Context, record: &Record) -> bool;

    fn can_delete_record(&self, ctx: &Context, record: &Record) -> bool;

    /// Field-level read.
    fn can_read_record_value(&self, ctx: &Context, module: &Module, field: &str) -> bool;

    /// Field-level update.
    fn can_update_record_value(&self, ctx: &Context, module: &Module, field: &str) -> bool;
}

/// Grants everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl AccessControl for AllowAll {
    fn can_read_namespace(&self, _: &Context, _: &Namespace) -> bool {
        true
    }

    fn can_read_module(&self, _: &Context, _: &Module) -> bool {
        true
    }

    fn can_create_record_on_module(&self, _: &Context, _: &Module) -> bool {
        true
    }

    fn can_search_records_on_module(&self, _: &Context, _: &Module) -> bool {
        true
    }

    fn can_read_record(&self, _: &Context, _: &Record) -> bool {
        true
    }

    fn can_update_record(&self, _: &Context, _: &Record) -> bool {
        true
    }

    fn can_delete_record(&self, _: &Context, _: &Record) -> bool {
        true
    }

    fn can_read_record_value(&self, _: &Context, _: &Module, _: &str) -> bool {
        true
    }

    fn can_update_record_value(&self, _: &Context, _: &Module, _: &str) -> bool {
        true
    }
}
