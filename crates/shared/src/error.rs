//! Error types shared across the client.

use thiserror::Error;

/// A failed request/response call. Surfaced to the caller; the store is
/// never mutated on failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// 401 from any endpoint. Receiving this also clears the session
    /// credential.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("failed to decode response: {0}")]
    Deserialize(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}

/// A single malformed inbound stream message. Handled by logging and
/// discarding that message; never closes the connection.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed stream envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("malformed `{kind}` payload: {source}")]
    Payload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}
