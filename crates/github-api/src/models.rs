//! Wire models for the subset of the GitHub API the pipelines consume.
//!
//! Only the fields actually read are declared; everything else in the
//! responses is ignored.

use serde::Deserialize;

/// A repository accessible to the service.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: Option<String>,
    pub owner: RepositoryOwner,
    pub default_branch: Option<String>,
}

/// Owner of a repository.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryOwner {
    pub login: String,
}

impl Repository {
    /// `owner/name` slug for logging and project lookups.
    #[must_use]
    pub fn slug(&self) -> String {
        self.full_name
            .clone()
            .unwrap_or_else(|| format!("{}/{}", self.owner.login, self.name))
    }
}

/// Response wrapper for `GET /installation/repositories`.
#[derive(Debug, Deserialize)]
pub struct InstallationRepositories {
    pub repositories: Vec<Repository>,
}

/// A branch as returned by the branch listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Branch {
    pub name: String,
    pub commit: BranchCommit,
}

/// Head commit of a branch.
#[derive(Debug, Clone, Deserialize)]
pub struct BranchCommit {
    pub sha: String,
}

/// An entry from the contents API - either a file or a directory.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    pub path: String,
    pub sha: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Base64-encoded payload, present only when a single file was requested.
    pub content: Option<String>,
    pub encoding: Option<String>,
}

impl ContentEntry {
    /// Whether this entry is a regular file.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == "file"
    }
}

/// A pull request.
///
/// `additions`/`deletions` are only populated by the single-PR endpoint;
/// the list endpoint omits them.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: Option<String>,
    pub additions: Option<u64>,
    pub deletions: Option<u64>,
    pub html_url: Option<String>,
}

/// A file changed by a pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestFile {
    pub filename: String,
    pub additions: u64,
    pub deletions: u64,
}

/// An issue on the hosting side.
#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub html_url: Option<String>,
}

/// A workflow definition.
#[derive(Debug, Clone, Deserialize)]
pub struct Workflow {
    pub id: u64,
    pub name: String,
    pub path: Option<String>,
}

/// Response wrapper for the workflow listing.
#[derive(Debug, Deserialize)]
pub struct WorkflowList {
    pub workflows: Vec<Workflow>,
}

/// A single workflow run.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    pub name: Option<String>,
    pub status: Option<String>,
    pub conclusion: Option<String>,
    pub html_url: Option<String>,
}

/// Response wrapper for the workflow run listing.
#[derive(Debug, Deserialize)]
pub struct WorkflowRunList {
    pub workflow_runs: Vec<WorkflowRun>,
}
