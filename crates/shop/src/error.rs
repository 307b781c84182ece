//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::fragments::FragmentError;
use crate::gateway::GatewayError;
use crate::store::StoreError;

/// Application-level error type for the shop.
#[derive(Debug, Error)]
pub enum AppError {
    /// Completion API call failed.
    #[error("Model gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// State document could not be replaced or persisted.
    #[error("State store error: {0}")]
    Store(#[from] StoreError),

    /// Page template could not be resolved.
    #[error("Fragment cache error: {0}")]
    Fragment(#[from] FragmentError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Whether the failure lies with the external model rather than this server.
    #[must_use]
    pub const fn is_upstream(&self) -> bool {
        match self {
            Self::Gateway(_) | Self::Fragment(FragmentError::Generation(_)) => true,
            Self::Store(err) => err.is_malformed_document(),
            _ => false,
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        if self.is_upstream() {
            return StatusCode::BAD_GATEWAY;
        }
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::BadRequest(_) => self.to_string(),
            _ if status == StatusCode::BAD_GATEWAY => "External service error".to_string(),
            _ => "Internal server error".to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
