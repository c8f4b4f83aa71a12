//! API client errors

use serde::Deserialize;

/// Errors returned by the platform API client
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The platform answered with a non-2xx status
    #[error("{method} {url} failed ({status}): {message}")]
    Status {
        method: String,
        url: String,
        status: u16,
        message: String,
    },

    /// The session could not be refreshed and has been cleared
    #[error("Session expired, sign in again at {login_route}")]
    SessionExpired { login_route: String },

    /// A request body could not be serialized
    #[error("Failed to encode request body for {url}: {source}")]
    Encode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// A success response carried a body of an unexpected shape
    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The client could not be built from its configuration
    #[error("Invalid API client configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Request(e) => e.status().map(|s| s.as_u16()),
            ApiError::SessionExpired { .. } => Some(401),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// True when the caller must sign in again
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::SessionExpired { .. })
    }

    /// Route to navigate to after an authentication failure
    pub fn redirect_route(&self) -> Option<&str> {
        match self {
            ApiError::SessionExpired { login_route } => Some(login_route),
            _ => None,
        }
    }
}

/// Error body returned by the platform: `{"error": "..."}` or `{"message": "..."}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Extract a human-readable message from an error response body
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .unwrap_or_else(|| body.trim().to_string())
}
