//! Error types for rt-csv-export
//!
//! The taxonomy mirrors how failures are handled by the export pipeline:
//! - Per-attachment and per-transaction failures are recoverable; callers
//!   record them in the [`ExportReport`](crate::report::ExportReport) and
//!   continue.
//! - A history page failure is fatal to that ticket's export.
//! - An authentication failure is fatal to the whole run, since every
//!   subsequent request would fail the same way.

use thiserror::Error;

/// Result type alias for rt-csv-export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for rt-csv-export
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "api.base_url")
        key: Option<String>,
    },

    /// Authentication rejected by the server (HTTP 401)
    ///
    /// Fatal to the whole export run: credentials that fail for one resource
    /// fail for all of them, so this is surfaced to the operator instead of
    /// being logged and skipped like other per-resource failures.
    #[error("authentication failed (HTTP 401) for {url}")]
    Auth {
        /// The URL that rejected the credentials
        url: String,
    },

    /// Non-success HTTP status from the server (other than 401)
    #[error("HTTP {status} fetching {url}")]
    Http {
        /// The HTTP status code returned
        status: u16,
        /// The URL that was fetched
        url: String,
    },

    /// Network/transport error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A required custom field is absent from the ticket
    ///
    /// Lookup misses are a typed NotFound condition, never a silent empty
    /// value. Whether a miss skips the ticket or emits an empty cell is
    /// decided by [`MissingFieldPolicy`](crate::config::MissingFieldPolicy).
    #[error("custom field not found: {name}")]
    FieldNotFound {
        /// The custom field name that was looked up
        name: String,
    },

    /// Attachment body is not valid base64
    #[error("attachment decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unparsable URL
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Whether this error aborts the whole export run rather than one ticket
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Auth { .. })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_are_fatal() {
        let err = Error::Auth {
            url: "http://rt.example/REST/2.0/ticket/1".to_string(),
        };
        assert!(err.is_fatal());
    }

    #[test]
    fn field_not_found_is_recoverable() {
        let err = Error::FieldNotFound {
            name: "Outcome".to_string(),
        };
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "custom field not found: Outcome");
    }
}
