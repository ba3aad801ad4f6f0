//! HTTP request driver
//!
//! One driver per session wraps a pooled `reqwest::Client` and the base URL
//! of the service under test. The same driver serves the REST surface and
//! the Connect surface: a Connect unary call is a JSON POST to a
//! method-shaped path.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use std::time::{Duration, Instant};

use super::response::{RequestOutcome, ResponseHandle, TransportError, TransportErrorKind};
use crate::common::{Error, HarnessConfig, Result};

/// Content type sent with request bodies unless a step overrides it
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Connect service hosting the health check
pub const HEALTH_SERVICE: &str = "health.v1.HealthService";

/// Path of the Connect health check method
pub const HEALTH_CHECK_PATH: &str = "/health.v1.HealthService/Check";

/// Description of one request, independent of any base URL
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RequestSpec {
    /// A GET with no body
    pub fn get(path: &str) -> Self {
        Self {
            method: Method::GET,
            path: path.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// A POST carrying the given body (JSON unless a content type is set)
    pub fn post(path: &str, body: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            path: path.to_string(),
            headers: Vec::new(),
            body: Some(body.into()),
        }
    }

    /// A Connect unary call with an empty request message
    pub fn connect_unary(service: &str, method: &str) -> Self {
        Self::post(&format!("/{}/{}", service, method), "{}")
    }

    /// Add a request header
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    fn has_content_type(&self) -> bool {
        self.headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case(CONTENT_TYPE.as_str()))
    }
}

/// Issues requests against the service under test
#[derive(Debug, Clone)]
pub struct HttpDriver {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpDriver {
    /// Build a driver for the configured service
    pub fn new(config: &HarnessConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("health-e2e/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url(),
            timeout: config.requests.timeout(),
        })
    }

    /// Base URL of the service, without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Issue a request with the sequential default timeout
    pub async fn request(&self, spec: &RequestSpec) -> RequestOutcome {
        self.request_with_timeout(spec, self.timeout).await
    }

    /// Issue a request with an explicit timeout
    ///
    /// Never fails on HTTP error statuses; only transport failures produce
    /// [`RequestOutcome::TransportError`].
    pub async fn request_with_timeout(&self, spec: &RequestSpec, timeout: Duration) -> RequestOutcome {
        let url = self.url(&spec.path);
        let started = Instant::now();

        let outcome = match self.build(spec, &url, timeout) {
            Ok(builder) => match builder.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    let headers = response.headers().clone();
                    match response.bytes().await {
                        Ok(body) => RequestOutcome::Response(ResponseHandle::new(
                            status,
                            headers,
                            body.to_vec(),
                        )),
                        Err(e) => RequestOutcome::TransportError(TransportError::from_reqwest(&url, &e)),
                    }
                }
                Err(e) => RequestOutcome::TransportError(TransportError::from_reqwest(&url, &e)),
            },
            Err(e) => RequestOutcome::TransportError(TransportError::new(
                TransportErrorKind::Other,
                &url,
                e.to_string(),
            )),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            RequestOutcome::Response(response) => tracing::debug!(
                method = %spec.method,
                url = %url,
                status = response.status(),
                elapsed_ms,
                "request completed"
            ),
            RequestOutcome::TransportError(error) => tracing::debug!(
                method = %spec.method,
                url = %url,
                kind = %error.kind,
                elapsed_ms,
                "request failed: {}",
                error.message
            ),
        }

        outcome
    }

    fn build(&self, spec: &RequestSpec, url: &str, timeout: Duration) -> Result<reqwest::RequestBuilder> {
        let mut headers = HeaderMap::new();
        for (name, value) in &spec.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::StepArgument(format!("Invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::StepArgument(format!("Invalid header value '{}': {}", value, e)))?;
            headers.insert(name, value);
        }

        if spec.body.is_some() && !spec.has_content_type() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        }

        let mut builder = self
            .client
            .request(spec.method.clone(), url)
            .headers(headers)
            .timeout(timeout);
        if let Some(body) = &spec.body {
            builder = builder.body(body.clone());
        }
        Ok(builder)
    }
}
