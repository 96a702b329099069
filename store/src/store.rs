//! Store interfaces.

use crate::{RecordFilter, StoreError, StoreResult};
use tessera_core::{ModuleId, NamespaceId, Record, RecordId, RecordValue, UserId};
use tessera_registry::{Module, Namespace};

/// Read access plus transaction entry point.
///
/// Writes are only reachable through a [`StoreTx`] obtained from [`Store::begin`];
/// use [`with_transaction`] rather than driving a transaction by hand.
pub trait Store: Send + Sync {
    fn lookup_namespace(&self, id: NamespaceId) -> StoreResult<Namespace>;

    fn lookup_module(&self, id: ModuleId) -> StoreResult<Module>;

    /// Load a module and the namespace it belongs to.
    fn lookup_module_with_namespace(
        &self,
        namespace_id: NamespaceId,
        module_id: ModuleId,
    ) -> StoreResult<(Namespace, Module)>;

    /// Load a record by ID; soft-deleted records are returned too.
    fn lookup_record(&self, module: &Module, id: RecordId) -> StoreResult<Record>;

    /// Search records; returns the set and the resolved filter.
    fn search_records(
        &self,
        module: &Module,
        filter: &RecordFilter,
    ) -> StoreResult<(Vec<Record>, RecordFilter)>;

    /// Find a live record of the module holding `value` in `field`.
    fn lookup_record_by_value(
        &self,
        module: &Module,
        field: &str,
        value: &RecordValue,
    ) -> StoreResult<Option<RecordId>>;

    fn user_exists(&self, id: UserId) -> StoreResult<bool>;

    fn attachment_exists(&self, id: u64) -> StoreResult<bool>;

    /// Open a transaction. It is rolled back unless committed.
    fn begin(&self) -> StoreResult<Box<dyn StoreTx + '_>>;
}

/// Write operations available inside a transaction.
pub trait StoreTx {
    fn create_record(&mut self, module: &Module, record: &Record) -> StoreResult<()>;

    /// Replace a stored record; also used for soft deletion.
    fn update_record(&mut self, module: &Module, record: &Record) -> StoreResult<()>;

    /// Replace only the named fields of the records referenced by each value's `record_id`.
    fn partial_value_update(&mut self, module: &Module, values: &[RecordValue]) -> StoreResult<()>;

    /// Search records as seen by this transaction.
    fn search_records(
        &mut self,
        module: &Module,
        filter: &RecordFilter,
    ) -> StoreResult<(Vec<Record>, RecordFilter)>;

    fn commit(self: Box<Self>) -> StoreResult<()>;

    fn rollback(self: Box<Self>) -> StoreResult<()>;
}

/// Run `f` inside a transaction.
///
/// Commits when `f` succeeds and rolls back on any error; the transaction is
/// released on every exit path.
pub fn with_transaction<T, E, F>(store: &dyn Store, f: F) -> Result<T, E>
where
    E: From<StoreError>,
    F: FnOnce(&mut dyn StoreTx) -> Result<T, E>,
{
    let mut tx = store.begin()?;
    match f(tx.as_mut()) {
        Ok(out) => {
            tx.commit()?;
            Ok(out)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                tracing::warn!(error = %rollback_err, "transaction rollback failed");
            }
            Err(err)
        }
    }
}
