//! Test world: one namespace, an inventory module and every collaborator.

use std::sync::Arc;
use tessera_access::StaticAccessControl;
use tessera_core::{Context, ModuleId, NamespaceId, Record, RecordValueSet, UserId};
use tessera_hooks::HookRegistry;
use tessera_journal::MemoryJournal;
use tessera_mutation::{RecordService, ServiceConfig};
use tessera_registry::{Field, FieldKind, Module, ModuleBuilder, Namespace, Registry, ValueExpr};
use tessera_store::{MemoryStore, RecordFilter};

/// The user most tests act as.
pub const CLERK: u64 = 100;
/// A second known user.
pub const MANAGER: u64 = 200;

pub struct World {
    pub namespace: Namespace,
    pub inventory: Module,
    pub store: Arc<MemoryStore>,
    pub access: Arc<StaticAccessControl>,
    pub hooks: Arc<HookRegistry>,
    pub journal: Arc<MemoryJournal>,
    pub service: RecordService,
}

impl World {
    pub fn new() -> Self {
        Self::with_config(ServiceConfig::default())
    }

    pub fn with_config(config: ServiceConfig) -> Self {
        let namespace = Namespace::new(NamespaceId::new(3), "warehouse");
        let inventory = inventory(namespace.id, ModuleId::new(30));

        let mut registry = Registry::new();
        registry
            .add_namespace(namespace.clone())
            .add_module(inventory.clone());

        let store = Arc::new(MemoryStore::new(registry));
        store.add_user(UserId::new(CLERK));
        store.add_user(UserId::new(MANAGER));

        let access = Arc::new(StaticAccessControl::new());
        let hooks = Arc::new(HookRegistry::new());
        let journal = Arc::new(MemoryJournal::new());

        let service = RecordService::new(store.clone(), access.clone())
            .with_hooks(hooks.clone())
            .with_audit(journal.clone())
            .with_config(config);

        Self {
            namespace,
            inventory,
            store,
            access,
            hooks,
            journal,
            service,
        }
    }

    pub fn ctx(&self) -> Context {
        Context::new(UserId::new(CLERK))
    }

    pub fn ctx_as(&self, user: u64) -> Context {
        Context::new(UserId::new(user))
    }

    /// Unsaved inventory record.
    pub fn record(&self, values: RecordValueSet) -> Record {
        Record::new(self.namespace.id, self.inventory.id).with_values(values)
    }

    /// Create an inventory record as the clerk.
    pub fn seed(&self, values: RecordValueSet) -> Record {
        match self.service.create(&self.ctx(), self.record(values)) {
            Ok(record) => record,
            Err(e) => panic!("seeding failed: {}", e),
        }
    }

    /// Live inventory records.
    pub fn filter(&self) -> RecordFilter {
        RecordFilter::new(self.namespace.id, self.inventory.id)
    }

    /// Stored state of a record.
    pub fn stored(&self, record: &Record) -> Record {
        match self.store.record(record.id) {
            Some(stored) => stored,
            None => panic!("record {} is not stored", record.id),
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

fn inventory(namespace_id: NamespaceId, id: ModuleId) -> Module {
    let built = ModuleBuilder::new(namespace_id, id, "inventory")
        .name("Inventory")
        .field(Field::new("sku", FieldKind::String).required().unique())
        .field(Field::new("name", FieldKind::String))
        .field(Field::new("qty", FieldKind::Number { precision: 0 }).with_range(Some(0.0), None))
        .field(Field::new("price", FieldKind::Number { precision: 2 }))
        .field(
            Field::new("total", FieldKind::Number { precision: 2 })
                .with_expression(ValueExpr::Product(vec!["qty".into(), "price".into()])),
        )
        .field(
            Field::new(
                "status",
                FieldKind::Select {
                    options: vec!["open".into(), "closed".into()],
                },
            )
            .with_default("open"),
        )
        .field(Field::new("position", FieldKind::Number { precision: 0 }))
        .field(Field::new("lane", FieldKind::String))
        .field(Field::new("notes", FieldKind::RichText))
        .field(Field::new("tags", FieldKind::String).multi())
        .field(Field::new("cost", FieldKind::Number { precision: 2 }))
        .field(Field::new("kit", FieldKind::Record { module_id: id }))
        .field(Field::new("assignee", FieldKind::User))
        .build();

    match built {
        Ok(module) => module,
        Err(e) => panic!("inventory module is invalid: {}", e),
    }
}
