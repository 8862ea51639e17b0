//! GitHub REST client for the warden pipelines.
//!
//! The [`GitHubApi`] trait is the seam the pipelines program against;
//! [`GitHubClient`] is the reqwest-backed implementation. Keeping the trait
//! separate lets pipeline tests run against in-memory fakes while the client
//! itself is exercised against a mock HTTP server.

mod client;
mod error;
pub mod models;

pub use client::{GitHubClient, DEFAULT_API_URL};
pub use error::GitHubError;

use async_trait::async_trait;

use models::{
    Branch, ContentEntry, Issue, PullRequest, PullRequestFile, Repository, Workflow, WorkflowRun,
};

/// Filter for pull request listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRequestState {
    Open,
    Closed,
    All,
}

impl PullRequestState {
    /// Query-string value for the listing endpoint.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::All => "all",
        }
    }
}

/// Review verdict attached to a pull request review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewEvent {
    Approve,
    RequestChanges,
    Comment,
}

impl ReviewEvent {
    /// Wire value for the review endpoint.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "APPROVE",
            Self::RequestChanges => "REQUEST_CHANGES",
            Self::Comment => "COMMENT",
        }
    }
}

/// Operations the pipelines perform against the hosting side.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// List the repositories accessible to the installation.
    async fn list_repositories(&self) -> Result<Vec<Repository>, GitHubError>;

    /// Fetch a single repository.
    async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository, GitHubError>;

    /// List branches of a repository.
    async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<Branch>, GitHubError>;

    /// Create a branch pointing at `sha`.
    async fn create_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        sha: &str,
    ) -> Result<(), GitHubError>;

    /// List the entries of a directory (non-recursive).
    async fn get_directory(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<ContentEntry>, GitHubError>;

    /// Fetch a file and decode its content to text.
    async fn get_file_text(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<String, GitHubError>;

    /// Create `path` on `branch`, or update it if it already exists.
    async fn create_or_update_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        content: &str,
        message: &str,
        branch: &str,
    ) -> Result<(), GitHubError>;

    /// Open a pull request from `head` to `base`.
    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<PullRequest, GitHubError>;

    /// List pull requests in the given state.
    async fn list_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        state: PullRequestState,
    ) -> Result<Vec<PullRequest>, GitHubError>;

    /// Fetch a single pull request, including its size counters.
    async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequest, GitHubError>;

    /// List the files changed by a pull request.
    async fn list_pull_request_files(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<PullRequestFile>, GitHubError>;

    /// Post a review on a pull request.
    async fn create_pull_request_review(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
        event: ReviewEvent,
    ) -> Result<(), GitHubError>;

    /// Open an issue.
    async fn create_issue(
        &self,
        owner: &str,
        repo: &str,
        title: &str,
        body: &str,
    ) -> Result<Issue, GitHubError>;

    /// List open issues.
    async fn list_issues(&self, owner: &str, repo: &str) -> Result<Vec<Issue>, GitHubError>;

    /// List workflow definitions.
    async fn list_workflows(&self, owner: &str, repo: &str) -> Result<Vec<Workflow>, GitHubError>;

    /// List recent runs of a workflow.
    async fn list_workflow_runs(
        &self,
        owner: &str,
        repo: &str,
        workflow_id: u64,
    ) -> Result<Vec<WorkflowRun>, GitHubError>;
}
