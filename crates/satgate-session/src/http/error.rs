/*
[INPUT]:  Error sources (HTTP transport, backend statuses, storage, signing)
[OUTPUT]: Structured error types with the status mapping callers branch on
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or changing the status mapping
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for the satgate session crate.
///
/// The enum is `Clone` so authentication outcomes can be shared with every
/// caller awaiting the same in-flight attempt; transport errors are carried
/// as their message rather than as `#[from]` sources.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Wallet failed or declined to produce a signature
    #[error("signing failed: {0}")]
    Signing(String),

    /// Backend does not know the address (HTTP 404 during sign-in)
    #[error("identity unknown to the service")]
    UnknownIdentity,

    /// Backend refuses service in this jurisdiction (HTTP 403)
    #[error("not permitted in this jurisdiction")]
    GeoRestricted,

    /// A previously issued token was rejected (HTTP 401)
    #[error("session no longer authorized")]
    Unauthorized,

    /// Re-authentication was attempted and the new token was rejected too
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Connectivity failure or backend 5xx
    #[error("network error: {0}")]
    Network(String),

    /// Request exceeded the application-level timeout
    #[error("request timed out")]
    Timeout,

    /// Backend returned a non-success status outside the mapped set
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Durable storage read/write failed
    #[error("storage error: {0}")]
    Storage(String),

    /// Wallet kind has no authentication strategy
    #[error("unsupported wallet kind: {0}")]
    UnsupportedWallet(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

impl SessionError {
    /// Map a non-success HTTP status to the session error taxonomy.
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        match status.as_u16() {
            401 => SessionError::Unauthorized,
            403 => SessionError::GeoRestricted,
            404 => SessionError::UnknownIdentity,
            code if code >= 500 => {
                SessionError::Network(format!("server error {code}: {}", message.into()))
            }
            code => SessionError::Api {
                status: code,
                message: message.into(),
            },
        }
    }

    /// Translate a transport-level failure, distinguishing timeouts.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SessionError::Timeout
        } else {
            SessionError::Network(err.to_string())
        }
    }

    /// Check if the error is a connectivity-kind failure the UI may retry
    pub fn is_network(&self) -> bool {
        matches!(self, SessionError::Network(_) | SessionError::Timeout)
    }

    /// Check if the error means the session must be re-established
    pub fn requires_reauth(&self) -> bool {
        matches!(self, SessionError::Unauthorized)
    }
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        SessionError::from_transport(err)
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::InvalidResponse(err.to_string())
    }
}

impl From<url::ParseError> for SessionError {
    fn from(err: url::ParseError) -> Self {
        SessionError::Config(format!("invalid URL: {err}"))
    }
}

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
