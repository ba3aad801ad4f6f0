//! Error types for the health-check harness
//!
//! Transport failures are not errors here: they are recorded as
//! [`crate::http::TransportError`] values and judged by the scenario's own
//! assertions. Everything in this enum either terminates a scenario or
//! aborts the run.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // === Readiness Errors ===
    #[error(
        "Failed to connect to server at {url} after {attempts} attempts (last failure: {last_error}). \
         Make sure the service is running and listening on port {port}"
    )]
    ServerNotReady {
        url: String,
        port: u16,
        attempts: u32,
        last_error: String,
    },

    // === Scenario Errors ===
    #[error("Assertion failed: {0}")]
    TestAssertion(String),

    #[error("Missing precedent: no '{key}' recorded in this scenario. A request step must run before this check")]
    MissingPrecedent { key: String },

    // === Step Resolution Errors ===
    #[error("Undefined step: {keyword} {text}")]
    UndefinedStep { keyword: String, text: String },

    #[error("Ambiguous step '{text}' matches {count} definitions: {patterns}")]
    AmbiguousStep {
        text: String,
        count: usize,
        patterns: String,
    },

    #[error("Invalid step argument: {0}")]
    StepArgument(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    #[error("Failed to open '{path}' for writing: {error}")]
    FileWrite { path: String, error: String },

    #[error("Failed to parse feature file '{path}': {error}")]
    FeatureParse { path: String, error: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === HTTP Errors ===
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Create an assertion failure from anything displayable
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::TestAssertion(message.into())
    }

    /// Create a missing precedent error for a context key
    pub fn missing_precedent(key: &str) -> Self {
        Self::MissingPrecedent {
            key: key.to_string(),
        }
    }

    /// Create an undefined step error
    pub fn undefined_step(keyword: &str, text: &str) -> Self {
        Self::UndefinedStep {
            keyword: keyword.trim().to_string(),
            text: text.to_string(),
        }
    }

    /// Create an ambiguous step error listing every matching pattern
    pub fn ambiguous_step<S: AsRef<str>>(text: &str, patterns: &[S]) -> Self {
        Self::AmbiguousStep {
            text: text.to_string(),
            count: patterns.len(),
            patterns: patterns
                .iter()
                .map(|p| format!("'{}'", p.as_ref()))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Whether this error is fatal for the whole run rather than one scenario
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::ServerNotReady { .. })
    }
}
