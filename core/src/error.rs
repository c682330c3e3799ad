//! Error types for the item repository and its records client.
//!
//! # Design
//! `NotFound` and `Validation` get dedicated variants because callers treat
//! "no such active item" and "bad input" differently from upstream failures.
//! Every non-2xx response lands in `Http` with the raw status code and body.

use thiserror::Error;

/// Errors returned by `RecordsClient` implementations and `ItemRepo`.
#[derive(Debug, Error)]
pub enum ItemError {
    /// No active record carries the requested item id.
    #[error("item not found: {id}")]
    NotFound { id: String },

    /// Input rejected before any request was sent.
    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// AirTable answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl ItemError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ItemError::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ItemError {
    fn from(err: reqwest::Error) -> Self {
        ItemError::Transport(err.to_string())
    }
}

impl From<figment::Error> for ItemError {
    fn from(err: figment::Error) -> Self {
        ItemError::Config(err.to_string())
    }
}
