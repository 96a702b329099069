//! Record service configuration.

use std::collections::HashMap;
use tessera_import::{OnError, IMPORT_ERROR_MAX_INDEX_COUNT};
use thiserror::Error;

const EMIT_EVENTS_KEY: &str = "TESSERA_EMIT_EVENTS";
const IMPORT_MAX_INDEX_COUNT_KEY: &str = "TESSERA_IMPORT_MAX_INDEX_COUNT";
const IMPORT_ON_ERROR_KEY: &str = "TESSERA_IMPORT_ON_ERROR";

/// Malformed configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{key}: {message}")]
pub struct ConfigError {
    pub key: &'static str,
    pub message: String,
}

impl ConfigError {
    fn new(key: &'static str, message: impl Into<String>) -> Self {
        Self {
            key,
            message: message.into(),
        }
    }
}

/// Settings of a [`crate::RecordService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Run before/after hooks around mutations.
    pub emit_events: bool,
    /// Failed row indexes an import keeps before truncating.
    pub import_max_index_count: usize,
    /// Policy for imports that do not set one.
    pub import_on_error: OnError,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            emit_events: true,
            import_max_index_count: IMPORT_ERROR_MAX_INDEX_COUNT,
            import_on_error: OnError::Skip,
        }
    }
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_emit_events(mut self, emit_events: bool) -> Self {
        self.emit_events = emit_events;
        self
    }

    pub fn with_import_max_index_count(mut self, count: usize) -> Self {
        self.import_max_index_count = count;
        self
    }

    pub fn with_import_on_error(mut self, on_error: OnError) -> Self {
        self.import_on_error = on_error;
        self
    }

    /// Read settings from key/value pairs; missing or blank keys keep defaults.
    pub fn from_kv(kv: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let emit_events = match kv.get(EMIT_EVENTS_KEY).map(|v| v.trim()) {
            None | Some("") => defaults.emit_events,
            Some(v) => parse_bool(v)
                .ok_or_else(|| ConfigError::new(EMIT_EVENTS_KEY, "must be a boolean"))?,
        };

        let import_max_index_count = match kv.get(IMPORT_MAX_INDEX_COUNT_KEY).map(|v| v.trim()) {
            None | Some("") => defaults.import_max_index_count,
            Some(v) => v
                .parse::<usize>()
                .map_err(|_| ConfigError::new(IMPORT_MAX_INDEX_COUNT_KEY, "must be an integer"))?,
        };

        let import_on_error = match kv.get(IMPORT_ON_ERROR_KEY).map(|v| v.trim()) {
            None | Some("") => defaults.import_on_error,
            Some(v) => v
                .parse::<OnError>()
                .map_err(|e| ConfigError::new(IMPORT_ON_ERROR_KEY, e.to_string()))?,
        };

        Ok(Self {
            emit_events,
            import_max_index_count,
            import_on_error,
        })
    }

    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_kv(&std::env::vars().collect())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}
