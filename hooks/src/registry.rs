//! In-process hook registry.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tessera_core::{Context, ModuleId, RecordId, ValueErrorSet};

use crate::{HookDispatcher, HookEvent, HookOutcome, HookPayload};

/// A registered hook.
pub type HookFn = Arc<dyn Fn(&Context, &mut HookPayload<'_>) -> HookOutcome + Send + Sync>;

struct Handler {
    event: HookEvent,
    /// `None` matches every module.
    module: Option<ModuleId>,
    /// Only matched by manual triggers with the same script name.
    script: Option<String>,
    priority: i32,
    run: HookFn,
}

impl Handler {
    fn matches(&self, payload: &HookPayload<'_>) -> bool {
        self.event == payload.event
            && self.module.map_or(true, |m| m == payload.module.id)
            && match (&self.script, payload.script) {
                (Some(own), Some(requested)) => own == requested,
                (Some(_), None) => false,
                (None, _) => true,
            }
    }
}

/// One dispatch, as seen by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub event: HookEvent,
    pub module_id: ModuleId,
    pub record_id: RecordId,
}

/// Dispatcher over handlers registered at runtime.
///
/// Handlers matching a payload run by descending priority, then in
/// registration order. Findings of all handlers are merged; the first
/// `SoftAbort` or `Fail` stops the chain.
#[derive(Default)]
pub struct HookRegistry {
    handlers: RwLock<Vec<Handler>>,
    calls: Mutex<Vec<Invocation>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an event, optionally scoped to one module.
    pub fn register<F>(&self, event: HookEvent, module: Option<ModuleId>, priority: i32, f: F) -> &Self
    where
        F: Fn(&Context, &mut HookPayload<'_>) -> HookOutcome + Send + Sync + 'static,
    {
        self.handlers.write().push(Handler {
            event,
            module,
            script: None,
            priority,
            run: Arc::new(f),
        });
        self
    }

    /// Register a handler for an event on every module.
    pub fn on<F>(&self, event: HookEvent, f: F) -> &Self
    where
        F: Fn(&Context, &mut HookPayload<'_>) -> HookOutcome + Send + Sync + 'static,
    {
        self.register(event, None, 0, f)
    }

    /// Register a manually triggered script.
    pub fn on_manual<F>(&self, script: impl Into<String>, f: F) -> &Self
    where
        F: Fn(&Context, &mut HookPayload<'_>) -> HookOutcome + Send + Sync + 'static,
    {
        self.handlers.write().push(Handler {
            event: HookEvent::OnManual,
            module: None,
            script: Some(script.into()),
            priority: 0,
            run: Arc::new(f),
        });
        self
    }

    /// Every dispatch so far, in order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.lock().clone()
    }

    /// Dispatches of one event.
    pub fn invocations_of(&self, event: HookEvent) -> Vec<Invocation> {
        self.calls
            .lock()
            .iter()
            .filter(|i| i.event == event)
            .cloned()
            .collect()
    }

    fn matching(&self, payload: &HookPayload<'_>) -> Vec<HookFn> {
        let handlers = self.handlers.read();
        let mut found: Vec<&Handler> = handlers.iter().filter(|h| h.matches(payload)).collect();
        found.sort_by(|a, b| b.priority.cmp(&a.priority));
        found.into_iter().map(|h| Arc::clone(&h.run)).collect()
    }
}

impl HookDispatcher for HookRegistry {
    fn invoke(&self, ctx: &Context, mut payload: HookPayload<'_>) -> HookOutcome {
        self.calls.lock().push(Invocation {
            event: payload.event,
            module_id: payload.module.id,
            record_id: payload.record.id,
        });

        // Handlers run without the lock held so they may register others.
        let handlers = self.matching(&payload);
        let mut errors = ValueErrorSet::new();

        for run in handlers {
            match run(ctx, &mut payload) {
                HookOutcome::Continue { errors: found } => errors.merge(found),
                stop => {
                    tracing::debug!(event = %payload.event, record_id = %payload.record.id, outcome = ?stop, "hook stopped dispatch");
                    return stop;
                }
            }
        }

        HookOutcome::Continue { errors }
    }
}
