//! Audit recorders.

use chrono::Utc;
use parking_lot::Mutex;
use tessera_core::Context;

use crate::entry::{ActionProps, AuditEntry, RecordAction, Seq};

/// Receives one call per audited operation.
///
/// Recording is fire-and-forget: implementations swallow their own failures.
pub trait AuditRecorder: Send + Sync {
    fn record(&self, ctx: &Context, action: RecordAction, props: ActionProps, error: Option<&str>);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRecorder;

impl AuditRecorder for NullRecorder {
    fn record(&self, _: &Context, _: RecordAction, _: ActionProps, _: Option<&str>) {}
}

#[derive(Debug)]
struct JournalState {
    entries: Vec<AuditEntry>,
    next_seq: Seq,
}

/// In-memory audit journal.
#[derive(Debug)]
pub struct MemoryJournal {
    state: Mutex<JournalState>,
}

impl MemoryJournal {
    /// Create a new empty journal.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(JournalState {
                entries: Vec::new(),
                next_seq: 1,
            }),
        }
    }

    /// Append an entry and return its sequence number.
    pub fn append(
        &self,
        ctx: &Context,
        action: RecordAction,
        props: ActionProps,
        error: Option<String>,
    ) -> Seq {
        let mut state = self.state.lock();
        let seq = state.next_seq;
        state.next_seq += 1;
        state.entries.push(AuditEntry {
            seq,
            at: Utc::now(),
            invoker: ctx.invoker,
            action,
            props,
            error,
        });
        seq
    }

    /// Snapshot of all entries.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.state.lock().entries.clone()
    }

    /// Entries of one action, in order.
    pub fn of_action(&self, action: RecordAction) -> Vec<AuditEntry> {
        self.state
            .lock()
            .entries
            .iter()
            .filter(|e| e.action == action)
            .cloned()
            .collect()
    }

    /// Actions in recording order.
    pub fn actions(&self) -> Vec<RecordAction> {
        self.state.lock().entries.iter().map(|e| e.action).collect()
    }

    /// Get entry by sequence number.
    pub fn get(&self, seq: Seq) -> Option<AuditEntry> {
        self.state.lock().entries.iter().find(|e| e.seq == seq).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryJournal {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditRecorder for MemoryJournal {
    fn record(&self, ctx: &Context, action: RecordAction, props: ActionProps, error: Option<&str>) {
        self.append(ctx, action, props, error.map(str::to_string));
    }
}

/// Emits audit entries as `tracing` events on the `audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRecorder;

impl AuditRecorder for TracingRecorder {
    fn record(&self, ctx: &Context, action: RecordAction, props: ActionProps, error: Option<&str>) {
        let props = serde_json::to_string(&props).unwrap_or_default();
        match error {
            Some(error) => tracing::warn!(
                target: "audit",
                action = %action,
                invoker = %ctx.invoker,
                props = %props,
                error,
                "record action failed"
            ),
            None => tracing::info!(
                target: "audit",
                action = %action,
                invoker = %ctx.invoker,
                props = %props,
                "record action"
            ),
        }
    }
}
