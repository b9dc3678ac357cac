//! Error taxonomy for backend calls

use thiserror::Error;

/// Errors from talking to the backend
#[derive(Error, Debug)]
pub enum ApiError {
    /// Connection refused, DNS failure, timeout, TLS...
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response; `message` comes from the error body when present
    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The stored token was rejected
    #[error("Session expired, please log in again")]
    Unauthorized,

    /// A 2xx response whose body could not be understood
    #[error("Unexpected response from server: {0}")]
    Malformed(String),

    /// An authenticated endpoint was called without a token
    #[error("Not logged in")]
    NotAuthenticated,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Message suitable for a user-facing notice.
    ///
    /// Server-provided messages are passed through; everything else falls back
    /// to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            ApiError::Status { message, .. } if !message.is_empty() => message.clone(),
            ApiError::Unauthorized | ApiError::NotAuthenticated => self.to_string(),
            ApiError::Malformed(_) => {
                "The server sent an unexpected response. Please try again later.".to_string()
            }
            _ => fallback.to_string(),
        }
    }

    /// Whether the session token should be discarded
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::NotAuthenticated)
    }
}
