//! Rule-driven access control.
//!
//! Everything is allowed unless a deny rule matches. A rule targets either
//! every caller or one user, and one operation on one resource. Record
//! operations match rules on the record itself and on its module.

use parking_lot::RwLock;
use std::collections::HashSet;
use tessera_core::{Context, ModuleId, NamespaceId, Record, RecordId, UserId};
use tessera_registry::{Module, Namespace};

use crate::AccessControl;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Create,
    Search,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resource {
    Namespace(NamespaceId),
    Module(ModuleId),
    Record(RecordId),
    /// A field of a module, by name.
    Field(ModuleId, String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Rule {
    /// `None` applies to every caller.
    user: Option<UserId>,
    op: Operation,
    resource: Resource,
}

/// Access control backed by an in-memory set of deny rules.
#[derive(Debug, Default)]
pub struct StaticAccessControl {
    denied: RwLock<HashSet<Rule>>,
}

impl StaticAccessControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deny an operation to every caller.
    pub fn deny(&self, op: Operation, resource: Resource) -> &Self {
        self.denied.write().insert(Rule {
            user: None,
            op,
            resource,
        });
        self
    }

    /// Deny an operation to one user.
    pub fn deny_for(&self, user: UserId, op: Operation, resource: Resource) -> &Self {
        self.denied.write().insert(Rule {
            user: Some(user),
            op,
            resource,
        });
        self
    }

    /// Drop every rule for an operation on a resource.
    pub fn allow(&self, op: Operation, resource: &Resource) -> &Self {
        self.denied
            .write()
            .retain(|r| !(r.op == op && &r.resource == resource));
        self
    }

    fn is_denied(&self, ctx: &Context, op: Operation, resources: &[Resource]) -> bool {
        let denied = self.denied.read();
        denied.iter().any(|rule| {
            rule.op == op
                && rule.user.map_or(true, |u| u == ctx.invoker)
                && resources.contains(&rule.resource)
        })
    }

    fn record_allowed(&self, ctx: &Context, op: Operation, record: &Record) -> bool {
        !self.is_denied(
            ctx,
            op,
            &[Resource::Module(record.module_id), Resource::Record(record.id)],
        )
    }
}

impl AccessControl for StaticAccessControl {
    fn can_read_namespace(&self, ctx: &Context, namespace: &Namespace) -> bool {
        !self.is_denied(ctx, Operation::Read, &[Resource::Namespace(namespace.id)])
    }

    fn can_read_module(&self, ctx: &Context, module: &Module) -> bool {
        !self.is_denied(ctx, Operation::Read, &[Resource::Module(module.id)])
    }

    fn can_create_record_on_module(&self, ctx: &Context, module: &Module) -> bool {
        !self.is_denied(ctx, Operation::Create, &[Resource::Module(module.id)])
    }

    fn can_search_records_on_module(&self, ctx: &Context, module: &Module) -> bool {
        !self.is_denied(ctx, Operation::Search, &[Resource::Module(module.id)])
    }

    fn can_read_record(&self, ctx: &Context, record: &Record) -> bool {
        self.record_allowed(ctx, Operation::Read, record)
    }

    fn can_update_record(&self, ctx: &Context, record: &Record) -> bool {
        self.record_allowed(ctx, Operation::Update, record)
    }

    fn can_delete_record(&self, ctx: &Context, record: &Record) -> bool {
        self.record_allowed(ctx, Operation::Delete, record)
    }

    fn can_read_record_value(&self, ctx: &Context, module: &Module, field: &str) -> bool {
        !self.is_denied(
            ctx,
            Operation::Read,
            &[Resource::Field(module.id, field.to_string())],
        )
    }

    fn can_update_record_value(&self, ctx: &Context, module: &Module, field: &str) -> bool {
        !self.is_denied(
            ctx,
            Operation::Update,
            &[Resource::Field(module.id, field.to_string())],
        )
    }
}
