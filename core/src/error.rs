//! Error types for the user API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because the detail view renders
//! "user not found" differently from a generic failure. Backend rejections
//! that carry a `{messages: [...]}` body become `Validation`; every other
//! non-2xx response lands in `HttpError` with the raw status and body.

use thiserror::Error;

/// Errors returned by `UserClient` parse methods and by transports.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404 for a single-item read.
    #[error("resource not found")]
    NotFound,

    /// The server returned a non-2xx status without a usable error body.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The request never produced a response (connect, timeout, reset).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The backend rejected a create/update payload.
    #[error("{}", messages.join(", "))]
    Validation { status: u16, messages: Vec<String> },

    /// The response body could not be deserialized into the expected envelope.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}

impl ApiError {
    /// Network failures and unexpected HTTP statuses.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::HttpError { .. } | ApiError::Transport(_))
    }
}
