//! Captured request outcomes
//!
//! A request yields exactly one [`RequestOutcome`]: either the service
//! answered (any status code, 4xx/5xx included) or the transport failed.

use reqwest::header::HeaderMap;
use serde_json::Value;
use std::fmt;
use std::sync::OnceLock;

use crate::common::{Error, Result};

/// Outcome of a single HTTP request
#[derive(Debug, Clone)]
pub enum RequestOutcome {
    /// The service answered
    Response(ResponseHandle),
    /// The request never produced a response
    TransportError(TransportError),
}

impl RequestOutcome {
    /// The captured response, if the service answered
    pub fn response(&self) -> Option<&ResponseHandle> {
        match self {
            RequestOutcome::Response(response) => Some(response),
            RequestOutcome::TransportError(_) => None,
        }
    }

    /// The transport failure, if the service never answered
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            RequestOutcome::Response(_) => None,
            RequestOutcome::TransportError(error) => Some(error),
        }
    }

    /// The response, or an assertion failure describing the transport error
    pub fn require_response(&self) -> Result<&ResponseHandle> {
        match self {
            RequestOutcome::Response(response) => Ok(response),
            RequestOutcome::TransportError(error) => Err(Error::assertion(format!(
                "No response received: request failed with {}",
                error
            ))),
        }
    }
}

/// An HTTP response captured in full
///
/// Immutable once captured; the JSON body is parsed on first access and
/// cached.
#[derive(Debug, Clone)]
pub struct ResponseHandle {
    status: u16,
    headers: HeaderMap,
    body: Vec<u8>,
    json: OnceLock<std::result::Result<Value, String>>,
}

impl ResponseHandle {
    pub fn new(status: u16, headers: HeaderMap, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
            json: OnceLock::new(),
        }
    }

    /// HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A header value as text, if present and valid UTF-8
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Raw body bytes
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as lossy UTF-8, for diagnostics
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parsed JSON body
    ///
    /// A body that is not JSON becomes an assertion failure, never a raw
    /// parse error.
    pub fn json(&self) -> Result<&Value> {
        self.json
            .get_or_init(|| serde_json::from_slice(&self.body).map_err(|e| e.to_string()))
            .as_ref()
            .map_err(|e| Error::assertion(format!("Response is not valid JSON: {}", e)))
    }
}

/// Coarse classification of a transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The per-request timeout elapsed
    Timeout,
    /// Connection refused, DNS failure, or TLS/handshake failure
    Connect,
    /// The response body could not be read
    Body,
    /// Anything else, including a worker that died
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Timeout => write!(f, "timeout"),
            TransportErrorKind::Connect => write!(f, "connect"),
            TransportErrorKind::Body => write!(f, "body"),
            TransportErrorKind::Other => write!(f, "other"),
        }
    }
}

/// A request that failed below the HTTP layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub url: String,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, url: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.to_string(),
            message: message.into(),
        }
    }

    /// Classify a reqwest error
    pub fn from_reqwest(url: &str, error: &reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            TransportErrorKind::Timeout
        } else if error.is_connect() {
            TransportErrorKind::Connect
        } else if error.is_body() || error.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Other
        };
        Self::new(kind, url, error.to_string())
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error on {}: {}", self.kind, self.url, self.message)
    }
}
