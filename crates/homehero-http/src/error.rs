//! Error types for HomeHero HTTP operations.

use std::io;
use thiserror::Error;

/// Result type for HomeHero HTTP operations.
pub type Result<T> = std::result::Result<T, HomeHeroError>;

/// Errors that can occur while talking to the backend or managing the session.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HomeHeroError {
    /// The request never reached the server or no response came back.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The backend token endpoint failed during sign-in.
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Identity provider error: {0}")]
    Identity(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl HomeHeroError {
    /// Status code of an HTTP failure, if this is one.
    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            HomeHeroError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this error is retryable.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            HomeHeroError::Http { status, .. } => {
                crate::client::utils::is_retryable_status(*status)
            }
            HomeHeroError::Network(_) => true,
            _ => false,
        }
    }

    /// Check if this is an access denied error.
    #[inline]
    #[must_use]
    pub fn is_access_denied(&self) -> bool {
        match self {
            HomeHeroError::Http { status, .. } => {
                crate::client::utils::is_access_denied_status(*status)
            }
            _ => false,
        }
    }

    /// Text suitable for a non-blocking notification.
    ///
    /// HTTP failures prefer the backend's `message` field when the body is a
    /// JSON object carrying one.
    pub fn user_message(&self) -> String {
        match self {
            HomeHeroError::Network(_) => {
                "Unable to reach the server. Please check your connection.".to_string()
            }
            HomeHeroError::Http { status, body } => {
                if crate::client::utils::is_access_denied_status(*status) {
                    return crate::navigation::SESSION_EXPIRED_MESSAGE.to_string();
                }
                serde_json::from_str::<serde_json::Value>(body)
                    .ok()
                    .and_then(|v| v.get("message")?.as_str().map(str::to_string))
                    .unwrap_or_else(|| format!("Request failed with status {}", status))
            }
            HomeHeroError::TokenExchange(_) => {
                "Signed in, but the server did not issue a session. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}
