//! Assertion failures.

use thiserror::Error;

pub type AssertionResult<T> = Result<T, AssertionError>;

#[derive(Debug, Error)]
pub enum AssertionError {
    #[error("expected success, got error: {0}")]
    UnexpectedError(String),

    #[error("expected an error matching {pattern:?}, got success")]
    ExpectedError { pattern: String },

    #[error("error {actual:?} does not match {pattern:?}")]
    ErrorMismatch { pattern: String, actual: String },

    #[error("invalid error pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("{what}: expected {expected}, got {actual}")]
    Mismatch {
        what: String,
        expected: String,
        actual: String,
    },
}

impl AssertionError {
    pub fn mismatch(
        what: impl Into<String>,
        expected: impl std::fmt::Debug,
        actual: impl std::fmt::Debug,
    ) -> Self {
        Self::Mismatch {
            what: what.into(),
            expected: format!("{:?}", expected),
            actual: format!("{:?}", actual),
        }
    }
}
