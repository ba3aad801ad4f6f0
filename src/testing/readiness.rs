//! Readiness gate
//!
//! Polls the liveness endpoint before any scenario runs. A fixed delay
//! separates attempts; the run aborts with [`Error::ServerNotReady`] once
//! every attempt has failed.

use tokio::time::sleep;

use crate::common::config::ReadinessConfig;
use crate::common::{Error, Result};
use crate::http::{HttpDriver, RequestOutcome, RequestSpec};

/// Successful readiness probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyReport {
    pub url: String,
    pub attempts: u32,
}

/// Block until the liveness endpoint answers 200
///
/// Returns on the first 200. Non-200 responses and transport failures both
/// count as "not ready". No delay follows the final attempt.
pub async fn wait_until_ready(
    driver: &HttpDriver,
    port: u16,
    readiness: &ReadinessConfig,
) -> Result<ReadyReport> {
    let url = driver.url(&readiness.path);
    let probe = RequestSpec::get(&readiness.path);
    let max_attempts = readiness.max_attempts.max(1);
    let mut last_error = String::from("no attempt made");

    for attempt in 1..=max_attempts {
        match driver
            .request_with_timeout(&probe, readiness.probe_timeout())
            .await
        {
            RequestOutcome::Response(response) if response.status() == 200 => {
                tracing::info!(url = %url, attempt, "service is ready");
                return Ok(ReadyReport {
                    url,
                    attempts: attempt,
                });
            }
            RequestOutcome::Response(response) => {
                last_error = format!("status {}", response.status());
            }
            RequestOutcome::TransportError(error) => {
                last_error = format!("{}: {}", error.kind, error.message);
            }
        }

        tracing::warn!(
            url = %url,
            attempt,
            max_attempts,
            "service not ready: {}",
            last_error
        );

        if attempt < max_attempts {
            sleep(readiness.retry_delay()).await;
        }
    }

    Err(Error::ServerNotReady {
        url,
        port,
        attempts: max_attempts,
        last_error,
    })
}
