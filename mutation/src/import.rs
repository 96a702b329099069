//! Record import.
//!
//! Rows are mapped onto fields by the session and created one by one through
//! the regular create path. Progress lands on the session.

use std::collections::BTreeMap;
use tessera_core::{Context, ModuleId, NamespaceId, Record};
use tessera_import::{ImportProgress, ImportSession, OnError};
use tessera_journal::{ActionProps, RecordAction};
use tracing::debug_span;

use crate::error::RecordResult;
use crate::service::RecordService;

impl RecordService {
    /// Start an import session with the configured failure policy.
    pub fn new_import_session(&self, namespace_id: NamespaceId, module_id: ModuleId) -> ImportSession {
        ImportSession::new(namespace_id, module_id).on_error(self.config.import_on_error)
    }

    /// Import `rows` into the session's module.
    ///
    /// Returns the final progress, which is also stored on the session. A row
    /// that fails is counted and, under [`OnError::Fail`], ends the import.
    pub fn import_rows(
        &self,
        ctx: &Context,
        session: &mut ImportSession,
        rows: &[BTreeMap<String, String>],
    ) -> RecordResult<ImportProgress> {
        let _span = debug_span!(
            "record.import",
            module_id = %session.module_id,
            rows = rows.len()
        )
        .entered();

        let props = ActionProps::new()
            .namespace(session.namespace_id)
            .module(session.module_id);
        let result = self.run_import(ctx, session, rows);
        self.audit_result(ctx, RecordAction::Import, props, &result);
        result
    }

    fn run_import(
        &self,
        ctx: &Context,
        session: &mut ImportSession,
        rows: &[BTreeMap<String, String>],
    ) -> RecordResult<ImportProgress> {
        let (_, module) = self.load_module(session.namespace_id, session.module_id)?;
        session.check_fields(|field| module.field(field).map(|f| f.multi))?;

        let mut progress = ImportProgress::new(self.now(), rows.len())
            .with_index_cap(self.config.import_max_index_count);

        for (index, row) in rows.iter().enumerate() {
            let record = Record::new(module.namespace_id, module.id)
                .with_values(session.map_row(row))
                .owned_by(session.owned_by);

            match self.create(ctx, record) {
                Ok(_) => progress.record_completed(),
                Err(err) => {
                    let message = match err.value_errors() {
                        Some(errors) => errors.to_string(),
                        None => err.to_string(),
                    };
                    tracing::debug!(index, error = %message, "import row failed");
                    progress.record_failed(index, message.as_str());

                    if session.on_error == OnError::Fail {
                        progress.fail(message);
                        break;
                    }
                }
            }
        }

        progress.finish(self.now());
        tracing::info!(
            completed = progress.completed,
            failed = progress.failed,
            "import finished"
        );
        session.progress = Some(progress.clone());
        Ok(progress)
    }
}
