//! Error types for API calls.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for API calls.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Failure of a single API call.
///
/// Callers above the client treat every variant the same way: as a failed
/// request with an optional human-readable message.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request never produced a response (connection refused, DNS, reset).
    #[error("request failed: {0}")]
    Transport(String),

    /// No response within the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The server answered with a non-2xx status.
    #[error("server returned {status}: {}", .detail.as_deref().unwrap_or("no details"))]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error text extracted from the response body, if any.
        detail: Option<String>,
    },

    /// The response body did not match the expected shape.
    #[error("invalid response: {0}")]
    Decode(String),

    /// The client could not be configured.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Returns a human-readable description, or `None` when the failure
    /// carries nothing beyond a bare status code.
    pub fn message(&self) -> Option<String> {
        match self {
            ClientError::Status { detail: None, .. } => None,
            ClientError::Status {
                status,
                detail: Some(detail),
            } => Some(format!("{} (HTTP {})", detail, status)),
            other => Some(other.to_string()),
        }
    }

    /// Returns the HTTP status, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true for a 404 response.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
