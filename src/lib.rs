//! health-e2e - behavior-driven end-to-end checks for a health-check service
//!
//! This library provides the HTTP driver, response validators, and
//! Gherkin scenario runner behind the `health-e2e` binary.

pub mod cli;
pub mod commands;
pub mod common;
pub mod http;
pub mod testing;
pub mod validators;

// Re-export commonly used types for tests
pub use common::{Error, HarnessConfig, Result};
pub use testing::{Runner, Session, StepRegistry};
