//! Test session
//!
//! One session per run: the resolved configuration and the HTTP driver
//! built from it. Scenarios share the session read-only.

use std::sync::Arc;

use super::readiness::{wait_until_ready, ReadyReport};
use crate::common::{HarnessConfig, Result};
use crate::http::HttpDriver;

/// Configuration and transport shared by every scenario of a run
#[derive(Debug)]
pub struct Session {
    config: HarnessConfig,
    driver: HttpDriver,
}

impl Session {
    /// Build a session without probing the service
    pub fn new(config: HarnessConfig) -> Result<Self> {
        let driver = HttpDriver::new(&config)?;
        Ok(Self { config, driver })
    }

    /// Build a session and pass the readiness gate
    ///
    /// Fails with [`crate::Error::ServerNotReady`] when the service never
    /// answers its liveness endpoint.
    pub async fn connect(config: HarnessConfig) -> Result<(Arc<Self>, ReadyReport)> {
        let session = Self::new(config)?;
        let report = session.wait_until_ready().await?;
        Ok((Arc::new(session), report))
    }

    /// Run the readiness gate against this session's service
    pub async fn wait_until_ready(&self) -> Result<ReadyReport> {
        wait_until_ready(&self.driver, self.config.server.port, &self.config.readiness).await
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn driver(&self) -> &HttpDriver {
        &self.driver
    }
}
