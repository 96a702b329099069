//! Reorder engine.
//!
//! Moves one record to a position of a numeric ordering field and shifts
//! every other record at or after that position down by one slot. The
//! position write, the re-scan and the shift share one transaction.

use regex_lite::Regex;
use std::sync::OnceLock;
use tessera_core::{Context, ModuleId, NamespaceId, RecordId, RecordValue};
use tessera_journal::{ActionProps, RecordAction};
use tessera_registry::Module;
use tessera_store::{with_transaction, CmpOp, Filter, RecordFilter, SortExpr};
use tracing::debug_span;

use crate::error::{RecordError, RecordResult};
use crate::service::RecordService;

static POSITION_RE: OnceLock<Regex> = OnceLock::new();

fn position_pattern() -> &'static Regex {
    POSITION_RE.get_or_init(|| Regex::new(r"^[0-9]+$").expect("regex literal compiles"))
}

/// A request to move one record within an ordered window.
#[derive(Debug, Clone, PartialEq)]
pub struct OrganizeRequest {
    pub namespace_id: NamespaceId,
    pub module_id: ModuleId,
    pub record_id: RecordId,
    /// Numeric, single-value ordering field.
    pub position_field: String,
    /// Target position; decimal digits only.
    pub position: String,
    /// Grouping field and the value the record moves into.
    pub group: Option<(String, String)>,
    /// Restricts the window of records that get shifted.
    pub filter: Option<Filter>,
}

impl OrganizeRequest {
    pub fn new(
        namespace_id: NamespaceId,
        module_id: ModuleId,
        record_id: RecordId,
        position_field: impl Into<String>,
        position: impl Into<String>,
    ) -> Self {
        Self {
            namespace_id,
            module_id,
            record_id,
            position_field: position_field.into(),
            position: position.into(),
            group: None,
            filter: None,
        }
    }

    pub fn in_group(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.group = Some((field.into(), value.into()));
        self
    }

    pub fn within(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }
}

impl RecordService {
    /// Move a record to a position; returns the number of shifted records.
    ///
    /// Either every position is written or none is.
    pub fn organize(&self, ctx: &Context, req: OrganizeRequest) -> RecordResult<usize> {
        let _span = debug_span!(
            "record.organize",
            record_id = %req.record_id,
            field = %req.position_field,
            position = %req.position
        )
        .entered();

        let mut props = ActionProps::new()
            .namespace(req.namespace_id)
            .module(req.module_id)
            .record(req.record_id)
            .field(&req.position_field);
        if let Some((group, _)) = &req.group {
            props = props.field(group);
        }
        if let Some(filter) = &req.filter {
            props = props.filter(filter);
        }

        let result = self.run_organize(ctx, &req);
        self.audit_result(ctx, RecordAction::Organize, props, &result);
        result
    }

    fn run_organize(&self, ctx: &Context, req: &OrganizeRequest) -> RecordResult<usize> {
        let (namespace, module, record) =
            self.load_record(req.namespace_id, req.module_id, req.record_id)?;

        if !self.access.can_update_record(ctx, &record) {
            return Err(RecordError::NotAllowedToUpdate(record.id));
        }

        if !position_pattern().is_match(&req.position) {
            return Err(RecordError::invalid_organize(format!(
                "position {:?} is not a non-negative integer",
                req.position
            )));
        }
        let position: u64 = req.position.parse().map_err(|_| {
            RecordError::invalid_organize(format!("position {} is out of range", req.position))
        })?;

        self.check_organize_field(ctx, &module, record.id, &req.position_field, true)?;
        if let Some((group, _)) = &req.group {
            self.check_organize_field(ctx, &module, record.id, group, false)?;
        }

        let field = req.position_field.as_str();
        let shifted = with_transaction(self.store.as_ref(), |tx| {
            let mut target =
                vec![RecordValue::new(field, position.to_string()).for_record(record.id)];
            if let Some((group, value)) = &req.group {
                target.push(RecordValue::new(group, value).for_record(record.id));
            }
            tx.partial_value_update(&module, &target)?;

            // The moved record keeps its new slot; everything else at or after it moves down.
            let tail = Filter::gte(field, position.to_string());
            let query = match &req.filter {
                Some(base) => Filter::And(vec![base.clone(), tail]),
                None => tail,
            }
            .and(Filter::cmp("id", CmpOp::Ne, record.id.raw().to_string()));

            let window = RecordFilter::new(namespace.id, module.id)
                .with_query(query)
                .sorted_by(SortExpr::asc(field));
            let (set, resolved) = tx.search_records(&module, &window)?;

            let mut next = position;
            let moved: Vec<RecordValue> = set
                .iter()
                .map(|r| {
                    next += 1;
                    RecordValue::new(field, next.to_string()).for_record(r.id)
                })
                .collect();
            tx.partial_value_update(&module, &moved)?;

            tracing::debug!(
                filter = ?resolved.query.map(|q| q.to_string()),
                shifted = moved.len(),
                "positions shifted"
            );
            Ok::<_, RecordError>(moved.len())
        })?;

        Ok(shifted)
    }

    /// The ordering (or grouping) field must exist, be single-value, and be
    /// writable by the caller. Only the ordering field must be numeric.
    fn check_organize_field(
        &self,
        ctx: &Context,
        module: &Module,
        record_id: RecordId,
        name: &str,
        numeric: bool,
    ) -> RecordResult<()> {
        let field = module
            .field(name)
            .ok_or_else(|| RecordError::field_not_found(name))?;

        if numeric && !field.is_numeric() {
            return Err(RecordError::invalid_organize(format!("field {name} is not numeric")));
        }
        if field.multi {
            return Err(RecordError::invalid_organize(format!("field {name} is multi-value")));
        }
        if !self.access.can_update_record_value(ctx, module, name) {
            return Err(RecordError::NotAllowedToUpdate(record_id));
        }
        Ok(())
    }
}
