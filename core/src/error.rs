//! Error types for the dida365 client and the plugin commands built on it.
//!
//! # Design
//! Every failure is a `DidaError` variant. Callers that need to react to a
//! class of failure rather than a specific variant use `DidaError::kind()`:
//! the retrying client re-authenticates only on `Auth` and `Network`, and
//! commands abort immediately on `Precondition`.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DidaError>;

/// Coarse classification of a `DidaError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Credentials or token were rejected.
    Auth,
    /// The request never completed or came back with a non-2xx status.
    Network,
    /// A 2xx response had a body of the wrong shape, or a request could not be encoded.
    Api,
    /// Command prerequisites are missing (no active document, absent capability).
    Precondition,
    /// Settings could not be read or written.
    Storage,
}

#[derive(Debug, Error)]
pub enum DidaError {
    /// Sign-on returned a non-2xx status.
    #[error("sign-on rejected (HTTP {status}): {body}")]
    AuthRejected { status: u16, body: String },

    /// An authenticated request came back 401.
    #[error("token rejected by server")]
    Unauthorized,

    /// The HTTP round-trip itself failed.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The server returned a non-2xx status other than 401.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The body parsed as JSON but lacked a field the endpoint always returns.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The response body could not be deserialized into the endpoint schema.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The request URL could not be assembled from the configured base.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Precondition(String),

    /// The user dismissed a prompt without choosing anything.
    #[error("cancelled")]
    Cancelled,

    #[error("settings storage failed: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DidaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DidaError::AuthRejected { .. } | DidaError::Unauthorized => ErrorKind::Auth,
            DidaError::Transport(_) | DidaError::HttpError { .. } => ErrorKind::Network,
            DidaError::UnexpectedResponse(_)
            | DidaError::DeserializationError(_)
            | DidaError::SerializationError(_)
            | DidaError::InvalidRequest(_) => ErrorKind::Api,
            DidaError::Precondition(_) | DidaError::Cancelled => ErrorKind::Precondition,
            DidaError::Storage(_) | DidaError::Io(_) => ErrorKind::Storage,
        }
    }

    /// Whether a fresh sign-on might make the same request succeed.
    pub fn triggers_relogin(&self) -> bool {
        matches!(self.kind(), ErrorKind::Auth | ErrorKind::Network)
    }

    pub(crate) fn precondition(msg: impl Into<String>) -> Self {
        DidaError::Precondition(msg.into())
    }
}
