//! Per-scenario context store
//!
//! Carries request results from one step to the next within a single
//! scenario. Each scenario gets a fresh store; nothing crosses scenarios.

use std::collections::HashMap;

use crate::common::{Error, Result};
use crate::http::{BatchResult, RequestOutcome, ResponseHandle};

/// Key written by single-request steps
pub const RESPONSE_KEY: &str = "response";

/// Key written by concurrent-batch steps
pub const BATCH_KEY: &str = "concurrent_results";

/// A value recorded by a step
#[derive(Debug, Clone)]
pub enum ContextValue {
    Outcome(RequestOutcome),
    Batch(BatchResult),
}

/// Mutable key/value store scoped to one scenario
#[derive(Debug, Default)]
pub struct ScenarioContext {
    values: HashMap<String, ContextValue>,
}

impl ScenarioContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value, replacing any earlier value under the same key
    pub fn set(&mut self, key: &str, value: ContextValue) {
        if self.values.insert(key.to_string(), value).is_some() {
            tracing::trace!(key, "context value replaced");
        }
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// The single-request outcome stored under `key`
    pub fn outcome(&self, key: &str) -> Result<&RequestOutcome> {
        match self.get(key) {
            Some(ContextValue::Outcome(outcome)) => Ok(outcome),
            Some(ContextValue::Batch(_)) => Err(Error::assertion(format!(
                "Context key '{}' holds a concurrent batch, not a single response",
                key
            ))),
            None => Err(Error::missing_precedent(key)),
        }
    }

    /// The response stored under `key`; a transport error fails the check
    pub fn response(&self, key: &str) -> Result<&ResponseHandle> {
        self.outcome(key)?.require_response()
    }

    /// The batch stored under `key`
    pub fn batch(&self, key: &str) -> Result<&BatchResult> {
        match self.get(key) {
            Some(ContextValue::Batch(batch)) => Ok(batch),
            Some(ContextValue::Outcome(_)) => Err(Error::assertion(format!(
                "Context key '{}' holds a single response, not a concurrent batch",
                key
            ))),
            None => Err(Error::missing_precedent(key)),
        }
    }

    /// The last single response recorded in this scenario
    pub fn last_response(&self) -> Result<&ResponseHandle> {
        self.response(RESPONSE_KEY)
    }

    /// The last concurrent batch recorded in this scenario
    pub fn last_batch(&self) -> Result<&BatchResult> {
        self.batch(BATCH_KEY)
    }
}
