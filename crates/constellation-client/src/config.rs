//! Client configuration.
//!
//! # Environment Variables
//!
//! - `CONSTELLATION_API_URL`: base URL of the CMDB API
//! - `CONSTELLATION_API_TIMEOUT_SECS`: per-request timeout in seconds

use std::time::Duration;

use url::Url;

use crate::error::{ClientError, Result};

/// Environment variable for the API base URL.
pub const API_URL_ENV: &str = "CONSTELLATION_API_URL";

/// Environment variable for the request timeout.
pub const API_TIMEOUT_ENV: &str = "CONSTELLATION_API_TIMEOUT_SECS";

/// Base URL used when none is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Timeout applied to every request when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// API client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL the fixed API paths are appended to.
    pub base_url: String,
    /// Timeout for each request.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Creates a configuration for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, falling back to defaults for
    /// unset or blank values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup(API_URL_ENV)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timeout = match lookup(API_TIMEOUT_ENV).filter(|v| !v.trim().is_empty()) {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    ClientError::Configuration(format!(
                        "{} must be a whole number of seconds, got '{}'",
                        API_TIMEOUT_ENV, raw
                    ))
                })?;
                if secs == 0 {
                    return Err(ClientError::Configuration(format!(
                        "{} must be at least 1 second",
                        API_TIMEOUT_ENV
                    )));
                }
                Duration::from_secs(secs)
            }
            None => DEFAULT_TIMEOUT,
        };

        Ok(Self { base_url, timeout })
    }

    /// Checks that the base URL is an absolute http(s) URL and the timeout
    /// is non-zero.
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(ClientError::Configuration(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        let url = Url::parse(&self.base_url).map_err(|e| {
            ClientError::Configuration(format!("invalid base URL '{}': {}", self.base_url, e))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ClientError::Configuration(format!(
                "unsupported URL scheme '{}' in '{}'",
                other, self.base_url
            ))),
        }
    }

    /// Builds a URL from path segments, percent-encoding each one so ids
    /// containing `/`, `?` or `#` stay within their segment.
    pub fn resource(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            ClientError::Configuration(format!("invalid base URL '{}': {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::Configuration(format!(
                    "base URL '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Joins an absolute API path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}
