// src/error.rs

//! Unified error handling for the relay.

use std::fmt;

use thiserror::Error;

/// Result type alias for relay operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed caller input, detected before any network effect
    #[error("Validation error: {0}")]
    Validation(String),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Transient network failure not originating from the HTTP client
    #[error("Network error: {0}")]
    Network(String),

    /// Every attempt allowed by the backoff policy failed
    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<AppError>,
    },

    /// Daily call quota used up
    #[error("Daily rate limit exceeded ({limit} calls per day)")]
    QuotaExceeded { limit: u32 },

    /// Content API response did not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Content API answered with a non-ok status
    #[error("API returned a non-ok status: {0}")]
    UpstreamStatus(String),

    /// A single result item could not be turned into a record
    #[error("Invalid record {id}: {message}")]
    Record { id: String, message: String },

    /// Queue transport rejected or failed the send
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// Queue reported a checksum that differs from the bytes sent
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    Integrity { expected: String, actual: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl AppError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a transient network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Create a malformed-response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }

    /// Create a per-record error.
    pub fn record(id: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Record {
            id: id.into(),
            message: message.to_string(),
        }
    }

    /// Create a delivery error.
    pub fn delivery(message: impl fmt::Display) -> Self {
        Self::Delivery(message.to_string())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether the backoff policy may try the failed operation again.
    ///
    /// Only transport-level failures qualify. Everything else describes a
    /// defect that waiting will not fix.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Network(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_errors_are_retryable() {
        assert!(AppError::network("connection reset").is_retryable());
        assert!(!AppError::validation("empty query").is_retryable());
        assert!(!AppError::QuotaExceeded { limit: 50 }.is_retryable());
        assert!(!AppError::malformed("no envelope").is_retryable());
        assert!(!AppError::UpstreamStatus("error".into()).is_retryable());
    }

    #[test]
    fn exhausted_retries_keeps_last_failure_as_source() {
        let err = AppError::RetriesExhausted {
            attempts: 4,
            last: Box::new(AppError::network("timed out")),
        };
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("Network error: timed out"));
        assert!(err.to_string().starts_with("Gave up after 4 attempts"));
    }
}
