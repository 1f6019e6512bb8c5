//! Client error types

use thiserror::Error;

/// Client error type.
///
/// Status classification happens once, in `HttpClient::handle_response`;
/// everything downstream matches on these variants instead of raw codes.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP transport failed before a response was classified
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// The request timed out. The server may have committed the write,
    /// so callers must not treat this as a plain failure.
    #[error("request timed out")]
    Timeout,

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required (401)
    #[error("Authentication required")]
    Unauthorized,

    /// Permission denied (403)
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error (400/422)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Duplicate resource (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Server shed the request (429)
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Gateway-class failure worth retrying (502/503/504)
    #[error("Transient server error ({status}): {body}")]
    Transient { status: u16, body: String },

    /// Server-side failure that retrying will not fix (500, other)
    #[error("Internal server error ({status}): {body}")]
    Internal { status: u16, body: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// Wrap a reqwest error, pulling timeouts out into their own variant
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(err)
        }
    }

    /// Whether a retry has any chance of succeeding.
    ///
    /// Timeouts are deliberately NOT retryable: the server may already
    /// have committed, and a blind retry risks a duplicate contract.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transient { .. } | Self::RateLimited(_) => true,
            Self::Http(e) => e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
