//! Dispatcher interface.

use tessera_core::Context;

use crate::{HookOutcome, HookPayload};

/// Runs the hooks registered for a payload's event.
pub trait HookDispatcher: Send + Sync {
    fn invoke(&self, ctx: &Context, payload: HookPayload<'_>) -> HookOutcome;
}

/// Dispatcher without hooks.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDispatcher;

impl HookDispatcher for NoopDispatcher {
    fn invoke(&self, _: &Context, _: HookPayload<'_>) -> HookOutcome {
        HookOutcome::proceed()
    }
}
