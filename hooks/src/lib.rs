//! Tessera Hooks
//!
//! Automation hooks invoked at fixed points of the record pipeline.
//!
//! Responsibilities:
//! - Define hook events and the payload a hook receives
//! - Report hook results as an explicit `HookOutcome`
//! - Dispatch to handlers registered per event, module and script

mod dispatcher;
mod event;
mod registry;

pub use dispatcher::{HookDispatcher, NoopDispatcher};
pub use event::{HookEvent, HookOutcome, HookPayload};
pub use registry::{HookFn, HookRegistry, Invocation};
