//! Batch validators
//!
//! A batch check applies one single-response validator to every entry of
//! a [`BatchResult`]. All entries are checked so the log shows every
//! failing slot; the step then fails once with an aggregate message.

use crate::common::{Error, Result};
use crate::http::{BatchResult, RequestOutcome, ResponseHandle};

/// Every entry has a response that satisfies `check`
pub fn all<F>(batch: &BatchResult, check: F) -> Result<()>
where
    F: Fn(&ResponseHandle) -> Result<()>,
{
    if batch.is_empty() {
        return Err(Error::assertion("No concurrent results found"));
    }

    let mut failures = Vec::new();
    for (index, outcome) in batch.outcomes().iter().enumerate() {
        let result = match outcome {
            RequestOutcome::Response(response) => check(response),
            RequestOutcome::TransportError(error) => Err(Error::assertion(format!(
                "Request failed with error: {}",
                error
            ))),
        };
        if let Err(e) = result {
            let reason = failure_text(e);
            tracing::warn!(entry = index, total = batch.len(), "concurrent request failed: {}", reason);
            failures.push((index, reason));
        }
    }

    match failures.first() {
        None => Ok(()),
        Some((index, reason)) => Err(Error::assertion(format!(
            "{} of {} concurrent requests failed; first failure (completion #{}): {}",
            failures.len(),
            batch.len(),
            index,
            reason
        ))),
    }
}

/// Every entry is a 200 response
pub fn all_succeeded(batch: &BatchResult) -> Result<()> {
    all(batch, |response| super::response::status_code(response, 200))
}

/// Every entry carries the given top-level `status`
pub fn all_status_field(batch: &BatchResult, expected: &str) -> Result<()> {
    all(batch, |response| super::response::status_field(response, expected))
}

/// Every entry carries complete, consistent connection statistics within
/// pool capacity
pub fn all_connection_stats_valid(batch: &BatchResult) -> Result<()> {
    all(batch, super::database::connection_stats_within_capacity)
}

fn failure_text(error: Error) -> String {
    match error {
        Error::TestAssertion(msg) => msg,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{TransportError, TransportErrorKind};
    use crate::validators::response::tests::response;

    fn refused() -> RequestOutcome {
        RequestOutcome::TransportError(TransportError::new(
            TransportErrorKind::Timeout,
            "http://localhost:8080/health",
            "operation timed out",
        ))
    }

    fn ok() -> RequestOutcome {
        RequestOutcome::Response(response(200, r#"{"status":"SERVING_STATUS_SERVING"}"#))
    }

    #[test]
    fn test_empty_batch_fails() {
        let err = all_succeeded(&BatchResult::default()).unwrap_err();
        assert!(err.to_string().contains("No concurrent results found"));
    }

    #[test]
    fn test_all_succeeded() {
        let batch = BatchResult::new(vec![ok(), ok(), ok()]);
        all_succeeded(&batch).unwrap();
        all_status_field(&batch, "SERVING_STATUS_SERVING").unwrap();
    }

    #[test]
    fn test_transport_error_fails_batch() {
        let batch = BatchResult::new(vec![ok(), refused(), ok()]);
        let msg = all_succeeded(&batch).unwrap_err().to_string();
        assert!(msg.contains("1 of 3 concurrent requests failed"));
        assert!(msg.contains("completion #1"));
        assert!(msg.contains("timeout error"));
    }

    #[test]
    fn test_every_failure_is_counted() {
        let batch = BatchResult::new(vec![
            RequestOutcome::Response(response(503, "{}")),
            ok(),
            RequestOutcome::Response(response(500, "{}")),
        ]);
        let msg = all_succeeded(&batch).unwrap_err().to_string();
        assert!(msg.contains("2 of 3 concurrent requests failed"));
        assert!(msg.contains("Expected status code 200, got 503"));
    }

    #[test]
    fn test_stats_validator_applies_per_entry() {
        let good = r#"{"database":{"status":"healthy","message":"ok","stats":{
            "max_open_connections":10,"open_connections":2,"in_use":1,"idle":1,
            "wait_count":0,"wait_duration":0,"max_idle_closed":0,"max_lifetime_closed":0}}}"#;
        let bad = good.replace(r#""idle":1"#, r#""idle":5"#);
        let batch = BatchResult::new(vec![
            RequestOutcome::Response(response(200, good)),
            RequestOutcome::Response(response(200, &bad)),
        ]);
        let msg = all_connection_stats_valid(&batch).unwrap_err().to_string();
        assert!(msg.contains("1 of 2"));
        assert!(msg.contains("should equal in_use"));

        let batch = BatchResult::new(vec![RequestOutcome::Response(response(200, good))]);
        all_connection_stats_valid(&batch).unwrap();
    }

    #[test]
    fn test_stats_validator_enforces_capacity() {
        let over = r#"{"database":{"status":"healthy","message":"ok","stats":{
            "max_open_connections":0,"open_connections":30,"in_use":30,"idle":0,
            "wait_count":0,"wait_duration":0,"max_idle_closed":0,"max_lifetime_closed":0}}}"#;
        let batch = BatchResult::new(vec![
            RequestOutcome::Response(response(200, over)),
            RequestOutcome::Response(response(200, over)),
        ]);
        let msg = all_connection_stats_valid(&batch).unwrap_err().to_string();
        assert!(msg.contains("2 of 2 concurrent requests failed"), "{}", msg);
        assert!(msg.contains("greater than 0"), "{}", msg);

        let crowded = over.replace(r#""max_open_connections":0"#, r#""max_open_connections":10"#);
        let batch = BatchResult::new(vec![RequestOutcome::Response(response(200, &crowded))]);
        let msg = all_connection_stats_valid(&batch).unwrap_err().to_string();
        assert!(msg.contains("should not exceed max open connections"), "{}", msg);
    }
}
