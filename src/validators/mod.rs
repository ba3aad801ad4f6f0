//! Response invariant validators
//!
//! Side-effect-free assertions over captured responses and batches. A
//! failing check returns [`crate::Error::TestAssertion`] naming the field,
//! the expected value, and the actual value; nothing here retries.

pub mod batch;
pub mod database;
pub mod response;

pub use database::PoolStats;
pub use response::SERVING_STATUS;
