//! Error type for Sentry API calls.

use thiserror::Error;

/// Errors returned by the Sentry client and reporter.
#[derive(Debug, Error)]
pub enum SentryError {
    /// The request never produced a usable response.
    #[error("request to Sentry failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Sentry answered with a non-success status.
    #[error("Sentry returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The configured DSN could not be parsed.
    #[error("invalid Sentry DSN: {0}")]
    InvalidDsn(String),
}
