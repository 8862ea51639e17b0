//! Pipeline error taxonomy.
//!
//! Collaborator-level failures (`GitHubError`, `SentryError`) are transient
//! and handled by [`retry`](crate::retry). What surfaces here is a pipeline
//! failure after retries are exhausted: tagged, carrying an HTTP-style
//! status, reported to the error monitor, and absorbed at the scheduler
//! boundary so the next tick still runs.

use github_api::GitHubError;
use thiserror::Error;

/// A pipeline failure surfaced after retries were exhausted.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("repository analysis failed: {message}")]
    AnalysisFailed { status: u16, message: String },

    #[error("documentation lint run failed: {message}")]
    LintFailed { status: u16, message: String },

    #[error("pull request creation failed: {message}")]
    PullRequestCreationFailed { status: u16, message: String },
}

impl PipelineError {
    pub(crate) fn analysis(context: &str, err: &GitHubError) -> Self {
        Self::AnalysisFailed {
            status: err.status().unwrap_or(500),
            message: format!("{context}: {err}"),
        }
    }

    pub(crate) fn lint(context: &str, err: &GitHubError) -> Self {
        Self::LintFailed {
            status: err.status().unwrap_or(500),
            message: format!("{context}: {err}"),
        }
    }

    pub(crate) fn pull_request(context: &str, err: &GitHubError) -> Self {
        Self::PullRequestCreationFailed {
            status: err.status().unwrap_or(500),
            message: format!("{context}: {err}"),
        }
    }

    /// HTTP-style status carried by this error.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::AnalysisFailed { status, .. }
            | Self::LintFailed { status, .. }
            | Self::PullRequestCreationFailed { status, .. } => *status,
        }
    }
}
