//! Error types for pageharvest
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for pageharvest
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    // ============================================================================
    // Page Classification Errors
    // ============================================================================
    #[error("Rate limited: {status} {message}")]
    RateLimited { status: u16, message: String },

    #[error("Not found: {status} {message}")]
    NotFound { status: u16, message: String },

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed page envelope: {message}")]
    MalformedPage { message: String },

    // ============================================================================
    // Engine Errors
    // ============================================================================
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Sink error: {0}")]
    Sink(#[from] anyhow::Error),

    #[error("Run cancelled")]
    Cancelled,
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a rate-limited error
    pub fn rate_limited(status: u16, message: impl Into<String>) -> Self {
        Self::RateLimited {
            status,
            message: message.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(status: u16, message: impl Into<String>) -> Self {
        Self::NotFound {
            status,
            message: message.into(),
        }
    }

    /// Create a generic status error
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Create a malformed-page error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPage {
            message: message.into(),
        }
    }

    /// Whether this error is expected to resolve on retry.
    ///
    /// Rate limits, generic non-2xx statuses, and transport failures
    /// (connect errors, timeouts) all consume retry budget. Everything
    /// else is terminal for the query that hit it.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::RateLimited { .. } | Error::Status { .. }
        )
    }

    /// Whether this error ends pagination gracefully.
    ///
    /// A not-found page means no further pages exist for the query, so it
    /// terminates pagination without counting as a failure.
    pub fn is_graceful_end(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Whether this error indicates the backend broke its response contract.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Error::MalformedPage { .. } | Error::JsonParse(_))
    }
}

/// Result type alias for pageharvest
pub type Result<T> = std::result::Result<T, Error>;
