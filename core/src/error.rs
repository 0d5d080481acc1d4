//! Error types for the students API client.
//!
//! # Design
//! `NotFound` gets its own variant because callers often want to tell "the
//! record is gone" apart from an unexpected status. Every other non-success
//! status lands in `HttpError` with the raw body. A 422 is not a separate
//! variant: the form view asks `field_errors()` and treats anything that
//! doesn't parse as an opaque failure.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Field name to message, as sent by the server in a 422 body.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Deserialize)]
struct ValidationBody {
    error: FieldErrors,
}

/// Errors returned by `StudentClient` parse methods and by the host's
/// transport. `Clone` so failed queries can be cached.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned an unexpected status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The request never produced a response (connection refused, DNS...).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The request outlived its deadline and was aborted.
    #[error("request timed out")]
    Timeout,

    /// The request was aborted by a newer request or an explicit cancel.
    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    /// HTTP status behind this error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound => Some(404),
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Per-field messages when this is a 422 carrying `{"error": {...}}`.
    pub fn field_errors(&self) -> Option<FieldErrors> {
        match self {
            ApiError::HttpError { status: 422, body } => {
                serde_json::from_str::<ValidationBody>(body).ok().map(|b| b.error)
            }
            _ => None,
        }
    }
}
