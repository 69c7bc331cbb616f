//! Error types for the transport module.
//!
//! This module defines the structured error surface for all transport
//! operations. Callers see either a parsed result, a cancellation, or a
//! [`TransferError`] — never a half-consumed response or a swallowed failure.

use thiserror::Error;

/// Errors that can occur during a transfer against the storage API.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The operation was cancelled via its cancellation token.
    ///
    /// Cancellation always propagates immediately: it is never retried,
    /// never wrapped, and never routed through the retry classifier.
    #[error("transfer cancelled")]
    Cancelled,

    /// Network-level error (DNS resolution, connection refused, TLS errors,
    /// mid-body stream failures, etc.)
    #[error("network error for {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Terminal HTTP failure: a non-success status with no retry processor
    /// willing to handle it.
    #[error("HTTP {status} for {url}: {message}")]
    Status {
        /// The URL that returned the error status.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// Response body, captured best-effort at failure time.
        body: String,
        /// Human-readable summary.
        message: String,
    },

    /// A non-success status whose response body could not be read while
    /// constructing the terminal error.
    ///
    /// The read failure is kept as the cause so callers still receive a
    /// structured error rather than a raw I/O failure.
    #[error("HTTP {status} for {url}; response body could not be read")]
    BodyRead {
        /// The URL that returned the error status.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// The body-read failure.
        #[source]
        source: reqwest::Error,
    },

    /// The response body was received but could not be decoded as the
    /// expected JSON shape.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        /// The URL whose response failed to decode.
        url: String,
        /// The underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// Local I/O error while streaming a body (source read, sink write).
    #[error("I/O error during transfer: {source}")]
    Io {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The provided URL is malformed or invalid.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The token source failed to produce a bearer token.
    #[error("token source error: {message}")]
    Token {
        /// Description of the token failure.
        message: String,
    },
}

impl TransferError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a terminal HTTP status error with its captured body.
    pub fn status(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        let url = url.into();
        let message = format!("server returned HTTP {status}");
        Self::Status {
            url,
            status,
            body: body.into(),
            message,
        }
    }

    /// Creates a terminal HTTP status error whose body read failed.
    pub fn body_read(url: impl Into<String>, status: u16, source: reqwest::Error) -> Self {
        Self::BodyRead {
            url: url.into(),
            status,
            source,
        }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }

    /// Creates a local I/O error.
    pub fn io(source: std::io::Error) -> Self {
        Self::Io { source }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a token source error.
    pub fn token(message: impl Into<String>) -> Self {
        Self::Token {
            message: message.into(),
        }
    }

    /// Returns the HTTP status code carried by this error, if any.
    ///
    /// Only status-bearing variants ([`Status`](Self::Status) and
    /// [`BodyRead`](Self::BodyRead)) report a code; network and local
    /// failures do not.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::BodyRead { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if this error is a cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

// Note on From trait implementations:
// We intentionally do NOT implement `From<reqwest::Error>` or
// `From<std::io::Error>` because the variants require context (url, status)
// that the source errors don't provide. The helper constructors are the
// pattern here.

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display_contains_code_and_url() {
        let error = TransferError::status("https://api.example.com/files/1", 503, "busy");
        let msg = error.to_string();
        assert!(msg.contains("503"), "Expected '503' in: {msg}");
        assert!(
            msg.contains("https://api.example.com/files/1"),
            "Expected URL in: {msg}"
        );
    }

    #[test]
    fn test_status_error_keeps_body() {
        let error = TransferError::status("https://api.example.com", 409, "conflict details");
        match error {
            TransferError::Status { body, status, .. } => {
                assert_eq!(status, 409);
                assert_eq!(body, "conflict details");
            }
            other => panic!("Expected Status, got: {other:?}"),
        }
    }

    #[test]
    fn test_status_code_accessor() {
        let error = TransferError::status("https://api.example.com", 500, "");
        assert_eq!(error.status_code(), Some(500));

        let error = TransferError::Cancelled;
        assert_eq!(error.status_code(), None);

        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        assert_eq!(TransferError::io(io_err).status_code(), None);
    }

    #[test]
    fn test_cancelled_display() {
        let error = TransferError::Cancelled;
        assert!(error.is_cancelled());
        assert!(error.to_string().contains("cancelled"));
    }

    #[test]
    fn test_invalid_url_display() {
        let error = TransferError::invalid_url("not-a-url");
        let msg = error.to_string();
        assert!(msg.contains("invalid URL"), "Expected 'invalid URL' in: {msg}");
        assert!(msg.contains("not-a-url"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error as _;

        let io_err = std::io::Error::new(std::io::ErrorKind::WriteZero, "sink full");
        let error = TransferError::io(io_err);
        assert!(error.source().is_some());
    }
}
