//! Record search filters.
//!
//! Filters are typed predicate trees rather than query strings; they render
//! to a readable expression for audit logs.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use tessera_core::{ModuleId, NamespaceId, Record};

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    /// Case-insensitive substring match.
    Like,
}

impl CmpOp {
    fn symbol(&self) -> &'static str {
        match self {
            CmpOp::Eq => "=",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Lte => "<=",
            CmpOp::Gt => ">",
            CmpOp::Gte => ">=",
            CmpOp::Like => "LIKE",
        }
    }
}

/// Predicate over a record's values.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Cmp {
        field: String,
        op: CmpOp,
        value: String,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn cmp(field: impl Into<String>, op: CmpOp, value: impl Into<String>) -> Self {
        Filter::Cmp {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::cmp(field, CmpOp::Eq, value)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::cmp(field, CmpOp::Gte, value)
    }

    /// Conjunction of two filters.
    pub fn and(self, other: Filter) -> Self {
        match self {
            Filter::And(mut parts) => {
                parts.push(other);
                Filter::And(parts)
            }
            first => Filter::And(vec![first, other]),
        }
    }

    /// Evaluate against a record.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Filter::Cmp { field, op, value } => {
                let candidates = field_values(record, field);
                match op {
                    CmpOp::Ne => candidates.iter().all(|c| compare(c, value) != Ordering::Equal),
                    CmpOp::Like => {
                        let needle = value.to_lowercase();
                        candidates.iter().any(|c| c.to_lowercase().contains(&needle))
                    }
                    _ => candidates.iter().any(|c| {
                        let ord = compare(c, value);
                        match op {
                            CmpOp::Eq => ord == Ordering::Equal,
                            CmpOp::Lt => ord == Ordering::Less,
                            CmpOp::Lte => ord != Ordering::Greater,
                            CmpOp::Gt => ord == Ordering::Greater,
                            CmpOp::Gte => ord != Ordering::Less,
                            CmpOp::Ne | CmpOp::Like => false,
                        }
                    }),
                }
            }
            Filter::And(parts) => parts.iter().all(|p| p.matches(record)),
            Filter::Or(parts) => parts.iter().any(|p| p.matches(record)),
            Filter::Not(inner) => !inner.matches(record),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Cmp { field, op, value } => {
                if value.parse::<f64>().is_ok() {
                    write!(f, "{} {} {}", field, op.symbol(), value)
                } else {
                    write!(f, "{} {} '{}'", field, op.symbol(), value.replace('\'', "\\'"))
                }
            }
            Filter::And(parts) | Filter::Or(parts) => {
                let joiner = if matches!(self, Filter::And(_)) {
                    " AND "
                } else {
                    " OR "
                };
                let rendered: Vec<String> = parts.iter().map(|p| format!("({})", p)).collect();
                f.write_str(&rendered.join(joiner))
            }
            Filter::Not(inner) => write!(f, "NOT ({})", inner),
        }
    }
}

/// Values a filter sees for a field name; `id` and `ownedBy` address system fields.
fn field_values(record: &Record, field: &str) -> Vec<String> {
    match field {
        "id" | "recordID" => vec![record.id.raw().to_string()],
        "ownedBy" => vec![record.owned_by.raw().to_string()],
        _ => record
            .values
            .iter()
            .filter(|v| v.name == field)
            .map(|v| v.value.clone())
            .collect(),
    }
}

/// Numeric comparison when both sides are numbers, lexical otherwise.
pub(crate) fn compare(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<f64>(), b.trim().parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

/// Sort instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortExpr {
    pub field: String,
    pub descending: bool,
}

impl SortExpr {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

/// Which records a search returns with respect to soft deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletedFilter {
    /// Only records that are not deleted.
    #[default]
    Exclude,
    /// Deleted and live records.
    Include,
    /// Only deleted records.
    Only,
}

/// Per-record check pushed down into the search (e.g. read permission).
pub type RecordCheck = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// Search request for records of one module.
#[derive(Clone, Default)]
pub struct RecordFilter {
    pub namespace_id: NamespaceId,
    pub module_id: ModuleId,
    pub query: Option<Filter>,
    pub sort: Vec<SortExpr>,
    pub limit: Option<usize>,
    pub deleted: DeletedFilter,
    pub check: Option<RecordCheck>,
    /// Number of matching records before `limit`, set by the store.
    pub total: Option<usize>,
}

impl RecordFilter {
    pub fn new(namespace_id: NamespaceId, module_id: ModuleId) -> Self {
        Self {
            namespace_id,
            module_id,
            ..Default::default()
        }
    }

    pub fn with_query(mut self, query: Filter) -> Self {
        self.query = Some(query);
        self
    }

    pub fn sorted_by(mut self, sort: SortExpr) -> Self {
        self.sort.push(sort);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_deleted(mut self, deleted: DeletedFilter) -> Self {
        self.deleted = deleted;
        self
    }

    pub fn with_check(mut self, check: RecordCheck) -> Self {
        self.check = Some(check);
        self
    }

    /// Returns true if the record passes everything except sorting and limit.
    pub fn accepts(&self, record: &Record) -> bool {
        if !self.module_id.is_zero() && record.module_id != self.module_id {
            return false;
        }
        if !self.namespace_id.is_zero() && record.namespace_id != self.namespace_id {
            return false;
        }
        let deleted_ok = match self.deleted {
            DeletedFilter::Exclude => !record.is_deleted(),
            DeletedFilter::Include => true,
            DeletedFilter::Only => record.is_deleted(),
        };
        if !deleted_ok {
            return false;
        }
        if let Some(query) = &self.query {
            if !query.matches(record) {
                return false;
            }
        }
        match &self.check {
            Some(check) => check(record),
            None => true,
        }
    }

    /// Order records according to the sort instructions; ties break on ID.
    pub fn sort_records(&self, records: &mut [Record]) {
        records.sort_by(|a, b| {
            for s in &self.sort {
                let va = a.values.first(&s.field).map(|v| v.value.as_str());
                let vb = b.values.first(&s.field).map(|v| v.value.as_str());
                let ord = match (va, vb) {
                    (None, None) => Ordering::Equal,
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (Some(x), Some(y)) => compare(x, y),
                };
                let ord = if s.descending { ord.reverse() } else { ord };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            a.id.cmp(&b.id)
        });
    }
}

impl fmt::Debug for RecordFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordFilter")
            .field("namespace_id", &self.namespace_id)
            .field("module_id", &self.module_id)
            .field("query", &self.query.as_ref().map(|q| q.to_string()))
            .field("sort", &self.sort)
            .field("limit", &self.limit)
            .field("deleted", &self.deleted)
            .field("check", &self.check.is_some())
            .field("total", &self.total)
            .finish()
    }
}
