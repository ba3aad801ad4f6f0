//! HTTP drivers for the service under test

pub mod batch;
pub mod client;
pub mod response;

pub use batch::{run_concurrent, BatchResult};
pub use client::{HttpDriver, RequestSpec, HEALTH_CHECK_PATH, HEALTH_SERVICE, JSON_CONTENT_TYPE};
pub use response::{RequestOutcome, ResponseHandle, TransportError, TransportErrorKind};
