//! Harness configuration
//!
//! Built once at session start and passed by reference into every
//! component. Resolution order: defaults, then the TOML config file, then
//! the `SERVER_PORT` environment variable, then command-line overrides.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use super::paths::config_path;
use super::{Error, Result};

/// Environment variable carrying the target service port
pub const PORT_ENV: &str = "SERVER_PORT";

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct HarnessConfig {
    /// Target service location
    #[serde(default)]
    pub server: ServerConfig,

    /// Readiness gate settings
    #[serde(default)]
    pub readiness: ReadinessConfig,

    /// Request timeout settings
    #[serde(default)]
    pub requests: RequestConfig,
}

/// Target service location
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Host name of the service under test
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port of the service under test
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    8080
}

/// Readiness gate settings
#[derive(Debug, Deserialize, Clone)]
pub struct ReadinessConfig {
    /// Liveness path polled before any scenario runs
    #[serde(default = "default_ping_path")]
    pub path: String,

    /// Number of probes before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between probes, in milliseconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Timeout for a single probe, in seconds
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            path: default_ping_path(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay(),
            probe_timeout_secs: default_probe_timeout(),
        }
    }
}

impl ReadinessConfig {
    /// Delay between probes
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Timeout for one probe
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

fn default_ping_path() -> String {
    "/ping".to_string()
}
fn default_max_attempts() -> u32 {
    5
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_probe_timeout() -> u64 {
    2
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize, Clone)]
pub struct RequestConfig {
    /// Timeout for sequential step requests
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,

    /// Timeout for each request of a concurrent batch
    #[serde(default = "default_concurrent_timeout")]
    pub concurrent_timeout_secs: u64,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_request_timeout(),
            concurrent_timeout_secs: default_concurrent_timeout(),
        }
    }
}

impl RequestConfig {
    /// Timeout for sequential step requests
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Timeout for each request of a concurrent batch
    pub fn concurrent_timeout(&self) -> Duration {
        Duration::from_secs(self.concurrent_timeout_secs)
    }
}

fn default_request_timeout() -> u64 {
    2
}
fn default_concurrent_timeout() -> u64 {
    5
}

impl HarnessConfig {
    /// Load configuration from an explicit file, or the default config file
    ///
    /// Returns default configuration if no file exists. The `SERVER_PORT`
    /// environment variable is applied on top of the file.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };

        if let Ok(raw) = std::env::var(PORT_ENV) {
            config.server.port = parse_port(&raw)?;
        }

        Ok(config)
    }

    /// Parse configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Base URL of the service under test, without a trailing slash
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.server.host, self.server.port)
    }
}

/// Parse a port value, ignoring a trailing inline comment
///
/// `"8080 # docker"` and `"8080#x"` both yield 8080.
pub fn parse_port(raw: &str) -> Result<u16> {
    let value = raw.split('#').next().unwrap_or_default().trim();
    if value.is_empty() {
        return Err(Error::Config(format!(
            "{} is empty (raw value '{}')",
            PORT_ENV, raw
        )));
    }
    value.parse().map_err(|_| {
        Error::Config(format!(
            "Invalid port '{}' in {} (raw value '{}')",
            value, PORT_ENV, raw
        ))
    })
}
