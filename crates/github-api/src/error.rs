//! Error type for GitHub API calls.

use thiserror::Error;

/// Errors returned by [`GitHubClient`](crate::GitHubClient).
#[derive(Debug, Error)]
pub enum GitHubError {
    /// The request never produced a usable response (DNS, TLS, timeout, body decode).
    #[error("request to GitHub failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// GitHub answered with a non-success status.
    #[error("GitHub returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The response arrived but did not have the expected shape.
    #[error("unexpected GitHub response: {0}")]
    Decode(String),

    /// The client could not be constructed from the given settings.
    #[error("invalid GitHub client configuration: {0}")]
    Config(String),
}

impl GitHubError {
    /// HTTP status associated with this error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            Self::Decode(_) | Self::Config(_) => None,
        }
    }

    /// Whether this error is a 404 from the API.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
