//! Sentry collaborator for the warden pipelines.
//!
//! Two halves: reading (project issue listings over the web API, bearer
//! token) and writing (exception capture to the store endpoint via a parsed
//! DSN). The [`ErrorMonitor`] trait covers both so pipelines can be tested
//! against an in-memory fake.

mod client;
mod error;
pub mod models;
mod reporter;

pub use client::{SentryClient, DEFAULT_API_URL};
pub use error::SentryError;
pub use reporter::{Dsn, ErrorReporter};

use async_trait::async_trait;

use models::{Level, SentryIssue};

/// What the pipelines need from the error monitor.
#[async_trait]
pub trait ErrorMonitor: Send + Sync {
    /// List issues for a project under the configured organization.
    async fn project_issues(&self, project_slug: &str) -> Result<Vec<SentryIssue>, SentryError>;

    /// Capture a message as an event. Best-effort; never fails the caller.
    async fn capture_message(&self, message: &str, level: Level);
}
