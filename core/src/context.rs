//! Execution context.

use crate::UserId;

/// Ambient caller identity, passed explicitly to every service call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    /// The user on whose behalf the call runs.
    pub invoker: UserId,
}

impl Context {
    pub fn new(invoker: UserId) -> Self {
        Self { invoker }
    }

    /// Context for an internal caller without a user.
    pub fn system() -> Self {
        Self::default()
    }
}
