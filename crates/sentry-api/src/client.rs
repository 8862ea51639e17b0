//! Reqwest-backed Sentry web API client.

use async_trait::async_trait;
use tracing::debug;

use crate::error::SentryError;
use crate::models::{Level, SentryIssue};
use crate::reporter::ErrorReporter;
use crate::ErrorMonitor;

/// Default Sentry web API endpoint.
pub const DEFAULT_API_URL: &str = "https://sentry.io/api/0";

/// Client for the Sentry web API, scoped to one organization.
#[derive(Debug, Clone)]
pub struct SentryClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    org: String,
    reporter: Option<ErrorReporter>,
}

impl SentryClient {
    /// Create a new client for `org`, authenticating with `token`.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        org: impl Into<String>,
    ) -> Result<Self, SentryError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            org: org.into(),
            reporter: None,
        })
    }

    /// Attach an exception reporter so `capture_message` delivers events.
    #[must_use]
    pub fn with_reporter(mut self, reporter: ErrorReporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// List issues for a project in this client's organization.
    pub async fn list_project_issues(
        &self,
        project_slug: &str,
    ) -> Result<Vec<SentryIssue>, SentryError> {
        let url = format!(
            "{}/projects/{}/{project_slug}/issues/",
            self.base_url, self.org
        );
        debug!(project = project_slug, "Listing Sentry issues");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SentryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl ErrorMonitor for SentryClient {
    async fn project_issues(&self, project_slug: &str) -> Result<Vec<SentryIssue>, SentryError> {
        self.list_project_issues(project_slug).await
    }

    async fn capture_message(&self, message: &str, level: Level) {
        match &self.reporter {
            Some(reporter) => reporter.capture_message(message, level).await,
            None => debug!(level = %level, message, "No DSN configured; event dropped"),
        }
    }
}
