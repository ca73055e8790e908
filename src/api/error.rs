//! Error types for the Immich API client.

use thiserror::Error;

/// Errors returned by calls against the Immich server.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The request URL.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The request URL.
        url: String,
    },

    /// The server answered with a non-200 status.
    #[error("server returned status {status} for {url}")]
    HttpStatus {
        /// The request URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response body was not the JSON we expected.
    #[error("cannot decode response from {url}: {source}")]
    Decode {
        /// The request URL.
        url: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The server answered for a different resource than the one requested.
    #[error("received ID {received:?} doesn't match expected ID {expected:?}")]
    IdMismatch {
        /// The requested ID.
        expected: String,
        /// The ID in the response.
        received: String,
    },
}

impl ApiError {
    /// Maps a reqwest error into a timeout or network error.
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Network { url, source }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates an ID mismatch error.
    pub fn id_mismatch(expected: impl Into<String>, received: impl Into<String>) -> Self {
        Self::IdMismatch {
            expected: expected.into(),
            received: received.into(),
        }
    }
}
