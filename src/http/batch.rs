//! Concurrent request orchestrator
//!
//! Fans a request out to `count` tasks, waits for every one of them, and
//! collects the outcomes in completion order.

use std::time::Duration;
use tokio::task::JoinSet;

use super::client::{HttpDriver, RequestSpec};
use super::response::{RequestOutcome, TransportError, TransportErrorKind};

/// Outcomes of one concurrent batch, in completion order
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    outcomes: Vec<RequestOutcome>,
}

impl BatchResult {
    pub fn new(outcomes: Vec<RequestOutcome>) -> Self {
        Self { outcomes }
    }

    /// Outcomes in completion order
    pub fn outcomes(&self) -> &[RequestOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of entries that never produced a response
    pub fn transport_failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.transport_error().is_some())
            .count()
    }
}

/// Run `count` identical requests concurrently
///
/// Each request carries its own `timeout`, so a stalled request only
/// affects its own slot. Returns once every request has finished; the
/// returned batch always has exactly `count` entries.
pub async fn run_concurrent(
    driver: &HttpDriver,
    count: usize,
    spec: &RequestSpec,
    timeout: Duration,
) -> BatchResult {
    let mut joins = JoinSet::new();
    for _ in 0..count {
        let driver = driver.clone();
        let spec = spec.clone();
        joins.spawn(async move { driver.request_with_timeout(&spec, timeout).await });
    }

    let mut outcomes = Vec::with_capacity(count);
    while let Some(result) = joins.join_next().await {
        let outcome = result.unwrap_or_else(|e| {
            RequestOutcome::TransportError(TransportError::new(
                TransportErrorKind::Other,
                &driver.url(&spec.path),
                format!("worker task failed: {}", e),
            ))
        });
        outcomes.push(outcome);
    }

    let batch = BatchResult::new(outcomes);
    tracing::debug!(
        count,
        path = %spec.path,
        transport_failures = batch.transport_failures(),
        "concurrent batch completed"
    );
    batch
}
