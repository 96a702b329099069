//! Import progress and the compressed fail log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ImportError;

/// Maximum number of failed row indexes kept individually.
pub const IMPORT_ERROR_MAX_INDEX_COUNT: usize = 500_000;

/// Failed row indexes.
///
/// Serialized as ascending `[start, end]` ranges; indexes whose difference
/// is at most one share a range. Decoding expands at most
/// [`IMPORT_ERROR_MAX_INDEX_COUNT`] indexes and marks the index truncated
/// past that.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<[usize; 2]>", try_from = "Vec<[usize; 2]>")]
pub struct RecordIndex {
    indexes: Vec<usize>,
    truncated: bool,
}

impl RecordIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, index: usize) {
        self.indexes.push(index);
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// True when decoded ranges held more indexes than are kept.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Retained indexes, sorted and deduplicated.
    pub fn indexes(&self) -> Vec<usize> {
        let mut out = self.indexes.clone();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Collapse the indexes into inclusive ranges.
    pub fn ranges(&self) -> Vec<[usize; 2]> {
        let mut sorted = self.indexes.clone();
        sorted.sort_unstable();

        let mut out = Vec::new();
        let mut iter = sorted.into_iter();
        let Some(first) = iter.next() else {
            return out;
        };

        let (mut start, mut prev) = (first, first);
        for i in iter {
            if i - prev > 1 {
                out.push([start, prev]);
                start = i;
            }
            prev = i;
        }
        out.push([start, prev]);
        out
    }
}

impl From<RecordIndex> for Vec<[usize; 2]> {
    fn from(index: RecordIndex) -> Self {
        index.ranges()
    }
}

impl TryFrom<Vec<[usize; 2]>> for RecordIndex {
    type Error = ImportError;

    fn try_from(ranges: Vec<[usize; 2]>) -> Result<Self, Self::Error> {
        let mut index = RecordIndex::new();

        for [start, end] in ranges {
            if end < start {
                return Err(ImportError::InvalidRange { start, end });
            }
            if index.truncated {
                continue;
            }

            let room = IMPORT_ERROR_MAX_INDEX_COUNT - index.indexes.len();
            let span = (end - start).saturating_add(1);
            if span > room {
                index.indexes.extend((start..=end).take(room));
                index.truncated = true;
            } else {
                index.indexes.extend(start..=end);
            }
        }
        Ok(index)
    }
}

/// Occurrence count per error message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorIndex(BTreeMap<String, usize>);

impl ErrorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, message: impl Into<String>) {
        *self.0.entry(message.into()).or_default() += 1;
    }

    pub fn count(&self, message: &str) -> usize {
        self.0.get(message).copied().unwrap_or(0)
    }

    /// Number of distinct messages.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }
}

/// Failures of an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredFailLog")]
pub struct FailLog {
    pub records: RecordIndex,
    /// Set once individual indexes stopped being retained.
    pub records_truncated: bool,
    pub errors: ErrorIndex,
    #[serde(skip_serializing)]
    cap: usize,
}

impl FailLog {
    pub fn new() -> Self {
        Self::with_cap(IMPORT_ERROR_MAX_INDEX_COUNT)
    }

    /// Fail log retaining at most `cap` indexes.
    pub fn with_cap(cap: usize) -> Self {
        Self {
            records: RecordIndex::new(),
            records_truncated: false,
            errors: ErrorIndex::new(),
            cap,
        }
    }

    /// Note a failed row.
    ///
    /// The message is always counted; the index only while the cap allows.
    pub fn record(&mut self, index: usize, message: impl Into<String>) {
        self.errors.add(message);
        if self.records_truncated {
            return;
        }
        if self.records.len() >= self.cap {
            self.records_truncated = true;
            return;
        }
        self.records.push(index);
    }
}

/// Serialized shape of a [`FailLog`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredFailLog {
    records: RecordIndex,
    #[serde(default)]
    records_truncated: bool,
    #[serde(default)]
    errors: ErrorIndex,
}

impl From<StoredFailLog> for FailLog {
    fn from(stored: StoredFailLog) -> Self {
        Self {
            records_truncated: stored.records_truncated || stored.records.is_truncated(),
            records: stored.records,
            errors: stored.errors,
            cap: IMPORT_ERROR_MAX_INDEX_COUNT,
        }
    }
}

impl Default for FailLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress of one import session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportProgress {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub entry_count: usize,
    pub completed: usize,
    pub failed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_reason: Option<String>,
    pub fail_log: FailLog,
}

impl ImportProgress {
    pub fn new(started_at: DateTime<Utc>, entry_count: usize) -> Self {
        Self {
            started_at,
            finished_at: None,
            entry_count,
            completed: 0,
            failed: 0,
            fail_reason: None,
            fail_log: FailLog::new(),
        }
    }

    /// Limit the number of retained failed indexes.
    pub fn with_index_cap(mut self, cap: usize) -> Self {
        self.fail_log.cap = cap;
        self
    }

    pub fn record_completed(&mut self) {
        self.completed += 1;
    }

    /// Count a failed row at zero-based `index`.
    pub fn record_failed(&mut self, index: usize, message: impl Into<String>) {
        self.failed += 1;
        self.fail_log.record(index, message);
    }

    /// Stop the import with a reason.
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.fail_reason = Some(reason.into());
    }

    pub fn finish(&mut self, at: DateTime<Utc>) {
        self.finished_at = Some(at);
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    /// Rows processed so far.
    pub fn processed(&self) -> usize {
        self.completed + self.failed
    }
}
