//! Shared fixture for the service tests.

use std::sync::Arc;
use tessera_access::StaticAccessControl;
use tessera_core::{Context, ModuleId, NamespaceId, Record, RecordValueSet, UserId};
use tessera_hooks::HookRegistry;
use tessera_journal::MemoryJournal;
use tessera_registry::{Field, FieldKind, Module, ModuleBuilder, Namespace, Registry};
use tessera_store::{MemoryStore, RecordFilter};

use crate::config::ServiceConfig;
use crate::RecordService;

pub(crate) const INVOKER: u64 = 7;

pub(crate) struct Fixture {
    pub namespace: Namespace,
    pub module: Module,
    pub other_module: Module,
    pub store: Arc<MemoryStore>,
    pub access: Arc<StaticAccessControl>,
    pub hooks: Arc<HookRegistry>,
    pub journal: Arc<MemoryJournal>,
    pub service: RecordService,
}

pub(crate) fn fixture() -> Fixture {
    Fixture::with_events(true)
}

impl Fixture {
    pub fn with_events(emit_events: bool) -> Self {
        let namespace = Namespace::new(NamespaceId::new(1), "crm");
        let module = task_module(namespace.id, ModuleId::new(10));
        let other_module = ModuleBuilder::new(namespace.id, ModuleId::new(11), "note")
            .field(Field::new("title", FieldKind::String))
            .build()
            .unwrap();

        let mut registry = Registry::new();
        registry
            .add_namespace(namespace.clone())
            .add_module(module.clone())
            .add_module(other_module.clone());

        let store = Arc::new(MemoryStore::new(registry));
        store.add_user(UserId::new(INVOKER));

        let access = Arc::new(StaticAccessControl::new());
        let hooks = Arc::new(HookRegistry::new());
        let journal = Arc::new(MemoryJournal::new());

        let service = RecordService::new(store.clone(), access.clone())
            .with_hooks(hooks.clone())
            .with_audit(journal.clone())
            .with_config(ServiceConfig::new().with_emit_events(emit_events));

        Self {
            namespace,
            module,
            other_module,
            store,
            access,
            hooks,
            journal,
            service,
        }
    }

    pub fn ctx(&self) -> Context {
        Context::new(UserId::new(INVOKER))
    }

    /// Unsaved record of the main module.
    pub fn record(&self, values: RecordValueSet) -> Record {
        Record::new(self.namespace.id, self.module.id).with_values(values)
    }

    /// Create a record through the service.
    pub fn seed(&self, values: RecordValueSet) -> Record {
        self.service.create(&self.ctx(), self.record(values)).unwrap()
    }

    /// Every live record of the main module.
    pub fn filter(&self) -> RecordFilter {
        RecordFilter::new(self.namespace.id, self.module.id)
    }
}

fn task_module(namespace_id: NamespaceId, id: ModuleId) -> Module {
    ModuleBuilder::new(namespace_id, id, "task")
        .field(Field::new("title", FieldKind::String).required())
        .field(Field::new("qty", FieldKind::Number { precision: 0 }))
        .field(Field::new("status", FieldKind::String).with_default("open"))
        .field(Field::new("secret", FieldKind::String))
        .field(Field::new("notes", FieldKind::RichText))
        .field(Field::new("tags", FieldKind::String).multi())
        .field(Field::new("position", FieldKind::Number { precision: 0 }))
        .field(Field::new("group", FieldKind::String))
        .field(Field::new("parent", FieldKind::Record { module_id: id }))
        .build()
        .unwrap()
}
