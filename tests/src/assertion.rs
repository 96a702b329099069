//! Assertion types and builders for verifying operation results.

use regex_lite::Regex;
use tessera_core::{Record, ValueErrorKind};
use tessera_mutation::{RecordError, RecordResult};

use crate::error::{AssertionError, AssertionResult};

/// A complete assertion for one record operation.
#[derive(Debug, Default)]
pub struct Assertion {
    // Success assertions
    pub values: Vec<(String, Option<String>)>,
    pub multi: Vec<(String, usize)>,
    pub deleted: Option<bool>,
    pub owned_by: Option<u64>,

    // Value error assertions
    pub value_errors: Option<usize>,
    pub value_error_kinds: Vec<(ValueErrorKind, usize)>,

    // Hard error assertions
    pub error_pattern: Option<String>,
}

impl Assertion {
    pub fn new() -> Self {
        Self::default()
    }

    /// First value of `field` equals `expected`.
    pub fn value(mut self, field: &str, expected: &str) -> Self {
        self.values.push((field.to_string(), Some(expected.to_string())));
        self
    }

    /// `field` has no value.
    pub fn missing(mut self, field: &str) -> Self {
        self.values.push((field.to_string(), None));
        self
    }

    /// `field` holds exactly `count` values.
    pub fn values_of(mut self, field: &str, count: usize) -> Self {
        self.multi.push((field.to_string(), count));
        self
    }

    pub fn deleted(mut self, deleted: bool) -> Self {
        self.deleted = Some(deleted);
        self
    }

    pub fn owned_by(mut self, user: u64) -> Self {
        self.owned_by = Some(user);
        self
    }

    /// Operation failed with exactly `count` value errors.
    pub fn value_errors(mut self, count: usize) -> Self {
        self.value_errors = Some(count);
        self
    }

    /// Operation failed with `count` value errors of `kind`.
    pub fn value_error(mut self, kind: ValueErrorKind, count: usize) -> Self {
        self.value_error_kinds.push((kind, count));
        self
    }

    /// Operation failed with an error whose message matches `pattern`.
    pub fn error(mut self, pattern: &str) -> Self {
        self.error_pattern = Some(pattern.to_string());
        self
    }

    fn expects_failure(&self) -> bool {
        self.value_errors.is_some()
            || !self.value_error_kinds.is_empty()
            || self.error_pattern.is_some()
    }

    /// Check `result` against every configured expectation.
    pub fn verify(&self, result: &RecordResult<Record>) -> AssertionResult<()> {
        match result {
            Ok(_) if self.expects_failure() => Err(AssertionError::ExpectedError {
                pattern: self
                    .error_pattern
                    .clone()
                    .unwrap_or_else(|| "value errors".to_string()),
            }),
            Ok(record) => self.verify_record(record),
            Err(err) if !self.expects_failure() => {
                Err(AssertionError::UnexpectedError(err.to_string()))
            }
            Err(err) => self.verify_error(err),
        }
    }

    fn verify_record(&self, record: &Record) -> AssertionResult<()> {
        for (field, expected) in &self.values {
            let actual = record.value(field);
            if actual != expected.as_deref() {
                return Err(AssertionError::mismatch(
                    format!("value of {}", field),
                    expected,
                    actual,
                ));
            }
        }

        for (field, count) in &self.multi {
            let actual = record.values.filter_by_name(field).len();
            if actual != *count {
                return Err(AssertionError::mismatch(
                    format!("number of {} values", field),
                    count,
                    actual,
                ));
            }
        }

        if let Some(deleted) = self.deleted {
            if record.is_deleted() != deleted {
                return Err(AssertionError::mismatch("deleted", deleted, record.is_deleted()));
            }
        }

        if let Some(owner) = self.owned_by {
            if record.owned_by.raw() != owner {
                return Err(AssertionError::mismatch("owner", owner, record.owned_by.raw()));
            }
        }

        Ok(())
    }

    fn verify_error(&self, err: &RecordError) -> AssertionResult<()> {
        if let Some(pattern) = &self.error_pattern {
            let re = Regex::new(pattern).map_err(|e| AssertionError::InvalidPattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            let actual = err.to_string();
            if !re.is_match(&actual) {
                return Err(AssertionError::ErrorMismatch {
                    pattern: pattern.clone(),
                    actual,
                });
            }
        }

        if self.value_errors.is_none() && self.value_error_kinds.is_empty() {
            return Ok(());
        }

        let Some(errors) = err.value_errors() else {
            return Err(AssertionError::UnexpectedError(err.to_string()));
        };

        if let Some(count) = self.value_errors {
            if errors.len() != count {
                return Err(AssertionError::mismatch("value error count", count, errors.len()));
            }
        }

        for (kind, count) in &self.value_error_kinds {
            let actual = errors.count_kind(kind);
            if actual != *count {
                return Err(AssertionError::mismatch(
                    format!("{} errors", kind.as_str()),
                    count,
                    actual,
                ));
            }
        }

        Ok(())
    }
}

/// Verify `result` and panic with the first failed expectation.
pub fn expect<F>(result: &RecordResult<Record>, build: F)
where
    F: FnOnce(Assertion) -> Assertion,
{
    if let Err(e) = build(Assertion::new()).verify(result) {
        panic!("{}", e);
    }
}
