//! In-memory store.
//!
//! A transaction holds the store lock for its whole lifetime, so concurrent
//! transactions serialize. The lock is reentrant: the thread that owns a
//! transaction can still read through the store and open nested
//! transactions, which behave as savepoints. Changes are applied directly and
//! tracked in an undo log per open scope; rollback replays the scope's log in
//! reverse, and committing a nested scope hands its log to the enclosing one.

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use tessera_core::{ModuleId, NamespaceId, Record, RecordId, RecordValue, UserId};
use tessera_registry::{Module, Namespace, Registry};

use crate::store::{Store, StoreTx};
use crate::{RecordFilter, StoreError, StoreResult};

#[derive(Debug, Default)]
struct MemoryState {
    registry: Registry,
    records: BTreeMap<RecordId, Record>,
    users: HashSet<UserId>,
    attachments: HashSet<u64>,
    /// Undo logs of the open transactions, innermost last.
    scopes: Vec<Vec<PendingChange>>,
}

impl MemoryState {
    fn search(&self, module: &Module, filter: &RecordFilter) -> (Vec<Record>, RecordFilter) {
        let mut scoped = filter.clone();
        scoped.module_id = module.id;

        let mut set: Vec<Record> = self
            .records
            .values()
            .filter(|r| scoped.accepts(r))
            .cloned()
            .collect();
        scoped.sort_records(&mut set);

        scoped.total = Some(set.len());
        if let Some(limit) = scoped.limit {
            set.truncate(limit);
        }
        (set, scoped)
    }

    fn track(&mut self, change: PendingChange) {
        if let Some(log) = self.scopes.last_mut() {
            log.push(change);
        }
    }

    /// Close the innermost scope, keeping its changes.
    fn release_scope(&mut self) {
        if let Some(log) = self.scopes.pop() {
            if let Some(parent) = self.scopes.last_mut() {
                parent.extend(log);
            }
        }
    }

    /// Close the innermost scope, undoing its changes.
    fn undo_scope(&mut self) {
        let Some(mut log) = self.scopes.pop() else {
            return;
        };
        while let Some(change) = log.pop() {
            match change {
                PendingChange::Created(id) => {
                    self.records.remove(&id);
                }
                PendingChange::Replaced(record) => {
                    self.records.insert(record.id, *record);
                }
            }
        }
    }
}

/// A change made inside a transaction, kept for rollback.
#[derive(Debug)]
enum PendingChange {
    Created(RecordId),
    Replaced(Box<Record>),
}

/// In-process store backed by a reentrant lock over a map.
#[derive(Debug)]
pub struct MemoryStore {
    state: ReentrantMutex<RefCell<MemoryState>>,
    writes: AtomicUsize,
    /// Writes left before an injected failure; negative disables injection.
    fail_after: AtomicI64,
}

impl MemoryStore {
    pub fn new(registry: Registry) -> Self {
        Self {
            state: ReentrantMutex::new(RefCell::new(MemoryState {
                registry,
                ..Default::default()
            })),
            writes: AtomicUsize::new(0),
            fail_after: AtomicI64::new(-1),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&MemoryState) -> T) -> T {
        let guard = self.state.lock();
        let state = guard.borrow();
        f(&state)
    }

    fn write<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> T {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        f(&mut state)
    }

    /// Register a user that reference checks can resolve.
    pub fn add_user(&self, id: UserId) {
        self.write(|state| state.users.insert(id));
    }

    /// Register an attachment that reference checks can resolve.
    pub fn add_attachment(&self, id: u64) {
        self.write(|state| state.attachments.insert(id));
    }

    /// Store a record directly, bypassing transactions.
    pub fn insert_record(&self, record: Record) {
        self.write(|state| state.records.insert(record.id, record));
    }

    /// Snapshot of a stored record.
    pub fn record(&self, id: RecordId) -> Option<Record> {
        self.read(|state| state.records.get(&id).cloned())
    }

    /// Snapshot of all records of a module, including deleted ones.
    pub fn records(&self, module_id: ModuleId) -> Vec<Record> {
        self.read(|state| {
            state
                .records
                .values()
                .filter(|r| r.module_id == module_id)
                .cloned()
                .collect()
        })
    }

    /// Number of write calls issued through transactions.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make the write after the next `writes` successful ones fail.
    pub fn fail_after_writes(&self, writes: usize) {
        self.fail_after
            .store(i64::try_from(writes).unwrap_or(i64::MAX), Ordering::SeqCst);
    }
}

impl Store for MemoryStore {
    fn lookup_namespace(&self, id: NamespaceId) -> StoreResult<Namespace> {
        self.read(|state| state.registry.namespace(id).cloned())
            .ok_or(StoreError::Registry(
                tessera_registry::RegistryError::NamespaceNotFound(id),
            ))
    }

    fn lookup_module(&self, id: ModuleId) -> StoreResult<Module> {
        self.read(|state| state.registry.module(id).cloned())
            .ok_or(StoreError::Registry(
                tessera_registry::RegistryError::ModuleNotFound(id),
            ))
    }

    fn lookup_module_with_namespace(
        &self,
        namespace_id: NamespaceId,
        module_id: ModuleId,
    ) -> StoreResult<(Namespace, Module)> {
        self.read(|state| -> StoreResult<(Namespace, Module)> {
            let (ns, m) = state
                .registry
                .module_with_namespace(namespace_id, module_id)?;
            Ok((ns.clone(), m.clone()))
        })
    }

    fn lookup_record(&self, module: &Module, id: RecordId) -> StoreResult<Record> {
        self.record(id)
            .ok_or_else(|| StoreError::record_not_found(module.id, id))
    }

    fn search_records(
        &self,
        module: &Module,
        filter: &RecordFilter,
    ) -> StoreResult<(Vec<Record>, RecordFilter)> {
        Ok(self.read(|state| state.search(module, filter)))
    }

    fn lookup_record_by_value(
        &self,
        module: &Module,
        field: &str,
        value: &RecordValue,
    ) -> StoreResult<Option<RecordId>> {
        Ok(self.read(|state| {
            state
                .records
                .values()
                .filter(|r| r.module_id == module.id && !r.is_deleted())
                .find(|r| {
                    r.values.iter().any(|v| {
                        v.name == field && v.value == value.value && v.reference == value.reference
                    })
                })
                .map(|r| r.id)
        }))
    }

    fn user_exists(&self, id: UserId) -> StoreResult<bool> {
        Ok(self.read(|state| state.users.contains(&id)))
    }

    fn attachment_exists(&self, id: u64) -> StoreResult<bool> {
        Ok(self.read(|state| state.attachments.contains(&id)))
    }

    fn begin(&self) -> StoreResult<Box<dyn StoreTx + '_>> {
        let guard = self.state.lock();
        guard.borrow_mut().scopes.push(Vec::new());
        Ok(Box::new(MemoryTx {
            state: guard,
            writes: &self.writes,
            fail_after: &self.fail_after,
            finished: false,
        }))
    }
}

/// Transaction over a [`MemoryStore`].
struct MemoryTx<'s> {
    state: ReentrantMutexGuard<'s, RefCell<MemoryState>>,
    writes: &'s AtomicUsize,
    fail_after: &'s AtomicI64,
    finished: bool,
}

impl MemoryTx<'_> {
    fn count_write(&self) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let left = self.fail_after.load(Ordering::SeqCst);
        if left == 0 {
            self.fail_after.store(-1, Ordering::SeqCst);
            return Err(StoreError::backend("injected write failure"));
        }
        if left > 0 {
            self.fail_after.store(left - 1, Ordering::SeqCst);
        }
        Ok(())
    }
}

impl StoreTx for MemoryTx<'_> {
    fn create_record(&mut self, module: &Module, record: &Record) -> StoreResult<()> {
        self.count_write()?;
        let mut state = self.state.borrow_mut();
        if state.records.contains_key(&record.id) {
            return Err(StoreError::Conflict(record.id));
        }
        let mut stored = record.clone();
        stored.module_id = module.id;
        for v in stored.values.iter_mut() {
            v.record_id = record.id;
        }
        state.records.insert(record.id, stored);
        state.track(PendingChange::Created(record.id));
        Ok(())
    }

    fn update_record(&mut self, module: &Module, record: &Record) -> StoreResult<()> {
        self.count_write()?;
        let mut state = self.state.borrow_mut();
        let mut stored = record.clone();
        for v in stored.values.iter_mut() {
            v.record_id = record.id;
        }
        match state.records.insert(record.id, stored) {
            Some(previous) => {
                state.track(PendingChange::Replaced(Box::new(previous)));
                Ok(())
            }
            None => {
                state.records.remove(&record.id);
                Err(StoreError::record_not_found(module.id, record.id))
            }
        }
    }

    fn partial_value_update(&mut self, module: &Module, values: &[RecordValue]) -> StoreResult<()> {
        if values.is_empty() {
            return Ok(());
        }
        self.count_write()?;
        let mut state = self.state.borrow_mut();

        for value in values {
            let record = state
                .records
                .get_mut(&value.record_id)
                .ok_or_else(|| StoreError::record_not_found(module.id, value.record_id))?;
            let previous = record.clone();
            record.values.retain(|v| v.name != value.name);
            record.values.push(value.clone());
            state.track(PendingChange::Replaced(Box::new(previous)));
        }
        Ok(())
    }

    fn search_records(
        &mut self,
        module: &Module,
        filter: &RecordFilter,
    ) -> StoreResult<(Vec<Record>, RecordFilter)> {
        Ok(self.state.borrow().search(module, filter))
    }

    fn commit(mut self: Box<Self>) -> StoreResult<()> {
        self.state.borrow_mut().release_scope();
        self.finished = true;
        Ok(())
    }

    fn rollback(mut self: Box<Self>) -> StoreResult<()> {
        self.state.borrow_mut().undo_scope();
        self.finished = true;
        Ok(())
    }
}

impl Drop for MemoryTx<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.state.borrow_mut().undo_scope();
        }
    }
}
