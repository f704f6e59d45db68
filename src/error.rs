//! Error types for edgar-dl
//!
//! This module provides the error taxonomy for the library:
//! - [`FetchError`] — per-identifier network/persistence failures, retried by
//!   the batch scheduler and reported on exhaustion, never fatal to a batch
//! - [`ParseError`] — malformed container content, scoped to one container
//! - [`Error`] — the top-level type everything else converts into
//!
//! Fetch and parse failures carry string/scalar payloads only, so failure
//! reports stay cloneable and serializable end to end.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for edgar-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for edgar-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_attempts")
        key: Option<String>,
    },

    /// Filename template resolution or uniquification failed
    #[error("filename error: {message}")]
    Filename {
        /// What went wrong while deriving a local filename
        message: String,
    },

    /// A single fetch attempt failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// A container could not be decomposed
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of one fetch attempt for one identifier
///
/// Produced by the fetch worker and consumed by the scheduler's retry loop.
/// Every variant is a value, never a panic — workers run in parallel tasks
/// and a fault must not cross the worker boundary.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchError {
    /// The request exceeded the configured timeout
    #[error("request timed out: {message}")]
    Timeout {
        /// Underlying client error text
        message: String,
    },

    /// TCP/TLS connection could not be established
    #[error("connection failed: {message}")]
    Connect {
        /// Underlying client error text
        message: String,
    },

    /// The server answered with a non-2xx status
    #[error("server returned status {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },

    /// The response body could not be read
    #[error("failed to read response body: {message}")]
    Body {
        /// Underlying client error text
        message: String,
    },

    /// The fetched body could not be persisted to the cache directory
    #[error("failed to persist container: {message}")]
    Io {
        /// Underlying I/O error text
        message: String,
    },

    /// Base URL + identifier did not form a valid URL
    #[error("invalid archive URL: {message}")]
    InvalidUrl {
        /// The offending URL and parser diagnostic
        message: String,
    },
}

/// Malformed container content
///
/// Scoped to a single container: the pipeline logs it and moves on to the
/// next container, it never aborts the batch.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The container has no `<SEC-HEADER>…</SEC-HEADER>` block
    #[error("container for {identifier} has no SEC-HEADER block")]
    MissingHeader {
        /// Identifier of the offending container
        identifier: String,
    },

    /// A GRAPHIC payload was not valid uuencoded data
    #[error("invalid uuencoded payload in {identifier}: {message}")]
    InvalidEncoding {
        /// Identifier of the offending container
        identifier: String,
        /// Decoder diagnostic
        message: String,
    },
}
