//! Error types for the model gateway.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when calling the completion service.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// HTTP request failed (connection, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service returned an error response.
    #[error("API error {status} ({error_type}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error type reported by the service.
        error_type: String,
        /// Error message.
        message: String,
    },

    /// Rate limited.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Account quota or billing limit exhausted.
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Authentication failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Failed to parse the service response.
    #[error("parse error: {0}")]
    Parse(String),

    /// The service answered without any text.
    #[error("completion contained no content")]
    EmptyCompletion,

    /// The model declined to answer.
    #[error("model refused: {0}")]
    Refused(String),

    /// The client could not be constructed.
    #[error("invalid gateway configuration: {0}")]
    InvalidConfig(String),
}

impl GatewayError {
    /// Whether a second attempt has a chance of succeeding.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::RateLimited(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Server-suggested delay before retrying, if any.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited(secs) => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }
}

/// Error response body from the completion API.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    /// Nested error details.
    pub error: ApiErrorDetail,
}

/// Nested error details.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorDetail {
    /// Error message.
    pub message: String,
    /// Error type (e.g. `invalid_request_error`).
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    /// Machine-readable code (e.g. `insufficient_quota`).
    #[serde(default)]
    pub code: Option<String>,
}
