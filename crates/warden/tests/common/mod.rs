//! In-memory fakes for the collaborator traits.
//!
//! Fixture data is set up before the fake is shared; recorded actions sit
//! behind mutexes so assertions can read them after a run.

// Each test binary uses a different slice of these helpers.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use github_api::models::{
    Branch, BranchCommit, ContentEntry, Issue, PullRequest, PullRequestFile, Repository,
    RepositoryOwner, Workflow, WorkflowRun,
};
use github_api::{GitHubApi, GitHubError, PullRequestState, ReviewEvent};
use sentry_api::models::{Level, SentryIssue};
use sentry_api::{ErrorMonitor, SentryError};
use warden::retry::RetryPolicy;

/// Retry policy that keeps tests fast.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_delay: Duration::from_millis(1),
        backoff_factor: 2,
    }
}

pub fn repository(owner: &str, name: &str, default_branch: &str) -> Repository {
    Repository {
        name: name.to_string(),
        full_name: Some(format!("{owner}/{name}")),
        owner: RepositoryOwner {
            login: owner.to_string(),
        },
        default_branch: Some(default_branch.to_string()),
    }
}

pub fn monitor_issue(title: &str, level: Level, count: u64) -> SentryIssue {
    serde_json::from_value(serde_json::json!({
        "id": title,
        "title": title,
        "level": serde_json::to_value(level).unwrap(),
        "count": count,
    }))
    .unwrap()
}

pub fn file_entry(name: &str) -> ContentEntry {
    ContentEntry {
        name: name.to_string(),
        path: name.to_string(),
        sha: format!("sha-{name}"),
        kind: "file".to_string(),
        content: None,
        encoding: None,
    }
}

pub fn dir_entry(name: &str) -> ContentEntry {
    ContentEntry {
        name: name.to_string(),
        path: name.to_string(),
        sha: format!("sha-{name}"),
        kind: "dir".to_string(),
        content: None,
        encoding: None,
    }
}

pub fn pull_request(number: u64, additions: u64, deletions: u64) -> PullRequest {
    PullRequest {
        number,
        title: Some(format!("change #{number}")),
        additions: Some(additions),
        deletions: Some(deletions),
        html_url: None,
    }
}

pub fn pr_file(name: &str) -> PullRequestFile {
    PullRequestFile {
        filename: name.to_string(),
        additions: 1,
        deletions: 0,
    }
}

pub fn workflow(id: u64, name: &str) -> Workflow {
    Workflow {
        id,
        name: name.to_string(),
        path: Some(format!(".github/workflows/{id}.yml")),
    }
}

pub fn workflow_run(id: u64, conclusion: &str) -> WorkflowRun {
    WorkflowRun {
        id,
        name: None,
        status: Some("completed".to_string()),
        conclusion: Some(conclusion.to_string()),
        html_url: None,
    }
}

fn not_found(what: &str) -> GitHubError {
    GitHubError::Api {
        status: 404,
        message: format!("{what} not found"),
    }
}

/// In-memory stand-in for the hosting side.
#[derive(Default)]
pub struct FakeGitHub {
    // Fixtures, keyed by `owner/name` slug.
    pub repositories: Vec<Repository>,
    pub directories: HashMap<String, Vec<ContentEntry>>,
    pub files: HashMap<(String, String), String>,
    pub pulls: HashMap<String, Vec<PullRequest>>,
    pub pull_files: HashMap<(String, u64), Vec<PullRequestFile>>,
    pub workflows: HashMap<String, Vec<Workflow>>,
    pub workflow_runs: HashMap<(String, u64), Vec<WorkflowRun>>,
    pub branches: Mutex<HashMap<String, Vec<Branch>>>,
    pub issues: Mutex<HashMap<String, Vec<Issue>>>,
    /// Slugs whose repository fetch should fail.
    pub broken_repositories: HashSet<String>,
    /// Slugs whose repository fetch fails this many times before succeeding.
    pub flaky_repositories: Mutex<HashMap<String, u32>>,

    // Recorded write actions.
    pub created_issues: Mutex<Vec<(String, String, String)>>,
    pub created_reviews: Mutex<Vec<(String, u64, String)>>,
    pub created_branches: Mutex<Vec<(String, String, String)>>,
    pub written_files: Mutex<Vec<(String, String, String, String)>>,
    pub created_pulls: Mutex<Vec<(String, String, String, String)>>,
}

impl FakeGitHub {
    pub fn with_repositories(repositories: Vec<Repository>) -> Self {
        Self {
            repositories,
            ..Self::default()
        }
    }

    pub fn seed_branches(&self, slug: &str, branches: Vec<Branch>) {
        self.branches
            .lock()
            .unwrap()
            .insert(slug.to_string(), branches);
    }

    pub fn seed_open_issue(&self, slug: &str, title: &str) {
        self.issues
            .lock()
            .unwrap()
            .entry(slug.to_string())
            .or_default()
            .push(Issue {
                number: 1,
                title: title.to_string(),
                state: "open".to_string(),
                html_url: None,
            });
    }

    fn find_repository(&self, owner: &str, repo: &str) -> Option<&Repository> {
        self.repositories
            .iter()
            .find(|r| r.owner.login == owner && r.name == repo)
    }
}

pub fn slug(owner: &str, repo: &str) -> String {
    format!("{owner}/{repo}")
}

#[async_trait]
impl GitHubApi for FakeGitHub {
    async fn list_repositories(&self) -> Result<Vec<Repository>, GitHubError> {
        Ok(self.repositories.clone())
    }

    async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository, GitHubError> {
        let key = slug(owner, repo);
        if self.broken_repositories.contains(&key) {
            return Err(GitHubError::Api {
                status: 500,
                message: format!("{key} is broken"),
            });
        }
        if let Some(remaining) = self.flaky_repositories.lock().unwrap().get_mut(&key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(GitHubError::Api {
                    status: 502,
                    message: format!("{key} flaked"),
                });
            }
        }
        self.find_repository(owner, repo)
            .cloned()
            .ok_or_else(|| not_found(&key))
    }

    async fn list_branches(&self, owner: &str, repo: &str) -> Result<Vec<Branch>, GitHubError> {
        Ok(self
            .branches
            .lock()
            .unwrap()
            .get(&slug(owner, repo))
            .cloned()
            .unwrap_or_default())
    }

    async fn create_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        sha: &str,
    ) -> Result<(), GitHubError> {
        let key = slug(owner, repo);
        self.created_branches
            .lock()
            .unwrap()
            .push((key.clone(), branch.to_string(), sha.to_string()));
        // Later listings see the new branch, like the real API.
        self.branches
            .lock()
            .unwrap()
            .entry(key)
            .or_default()
            .push(Branch {
                name: branch.to_string(),
                commit: BranchCommit {
                    sha: sha.to_string(),
                },
            });
        Ok(())
    }

    async fn get_directory(
        &self,
        owner: &str,
        repo: &str,
        _path: &str,
    ) -> Result<Vec<ContentEntry>, GitHubError> {
        Ok(self
            .directories
            .get(&slug(owner, repo))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_file_text(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<String, GitHubError> {
        self.files
            .get(&(slug(owner, repo), path.to_string()))
            .cloned()
            .ok_or_else(|| not_found(path))
    }

    async fn create_or_update_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        content: &str,
        _message: &str,
        branch: &str,
    ) -> Result<(), GitHubError> {
        self.written_files.lock().unwrap().push((
            slug(owner, repo),
            path.to_string(),
            branch.to_string(),
            content.to_string(),
        ));
        Ok(())
    }

    async fn create_pull_request(
        &self,
        owner: &str,
        repo: &str,
        title: &str,
        _body: &str,
        head: &str,
        base: &str,
    ) -> Result<PullRequest, GitHubError> {
        let mut created = self.created_pulls.lock().unwrap();
        created.push((
            slug(owner, repo),
            title.to_string(),
            head.to_string(),
            base.to_string(),
        ));
        let number = 100 + created.len() as u64;
        Ok(PullRequest {
            number,
            title: Some(title.to_string()),
            additions: None,
            deletions: None,
            html_url: Some(format!("https://github.test/{owner}/{repo}/pull/{number}")),
        })
    }

    async fn list_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        _state: PullRequestState,
    ) -> Result<Vec<PullRequest>, GitHubError> {
        // The real listing omits the size counters.
        Ok(self
            .pulls
            .get(&slug(owner, repo))
            .map(|prs| {
                prs.iter()
                    .map(|pr| PullRequest {
                        additions: None,
                        deletions: None,
                        ..pr.clone()
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_pull_request(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<PullRequest, GitHubError> {
        self.pulls
            .get(&slug(owner, repo))
            .and_then(|prs| prs.iter().find(|pr| pr.number == number))
            .cloned()
            .ok_or_else(|| not_found(&format!("pull request {number}")))
    }

    async fn list_pull_request_files(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<PullRequestFile>, GitHubError> {
        Ok(self
            .pull_files
            .get(&(slug(owner, repo), number))
            .cloned()
            .unwrap_or_default())
    }

    async fn create_pull_request_review(
        &self,
        owner: &str,
        repo: &str,
        number: u64,
        body: &str,
        _event: ReviewEvent,
    ) -> Result<(), GitHubError> {
        self.created_reviews
            .lock()
            .unwrap()
            .push((slug(owner, repo), number, body.to_string()));
        Ok(())
    }

    async fn create_issue(
        &self,
        owner: &str,
        repo: &str,
        title: &str,
        body: &str,
    ) -> Result<Issue, GitHubError> {
        let key = slug(owner, repo);
        self.created_issues
            .lock()
            .unwrap()
            .push((key.clone(), title.to_string(), body.to_string()));
        let issue = Issue {
            number: self.created_issues.lock().unwrap().len() as u64,
            title: title.to_string(),
            state: "open".to_string(),
            html_url: None,
        };
        self.issues
            .lock()
            .unwrap()
            .entry(key)
            .or_default()
            .push(issue.clone());
        Ok(issue)
    }

    async fn list_issues(&self, owner: &str, repo: &str) -> Result<Vec<Issue>, GitHubError> {
        Ok(self
            .issues
            .lock()
            .unwrap()
            .get(&slug(owner, repo))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_workflows(&self, owner: &str, repo: &str) -> Result<Vec<Workflow>, GitHubError> {
        Ok(self
            .workflows
            .get(&slug(owner, repo))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_workflow_runs(
        &self,
        owner: &str,
        repo: &str,
        workflow_id: u64,
    ) -> Result<Vec<WorkflowRun>, GitHubError> {
        Ok(self
            .workflow_runs
            .get(&(slug(owner, repo), workflow_id))
            .cloned()
            .unwrap_or_default())
    }
}

/// In-memory stand-in for the error monitor.
#[derive(Default)]
pub struct FakeMonitor {
    pub issues: HashMap<String, Vec<SentryIssue>>,
    /// Project slugs whose listing should fail.
    pub broken_projects: HashSet<String>,
    pub captured: Mutex<Vec<String>>,
}

#[async_trait]
impl ErrorMonitor for FakeMonitor {
    async fn project_issues(&self, project_slug: &str) -> Result<Vec<SentryIssue>, SentryError> {
        if self.broken_projects.contains(project_slug) {
            return Err(SentryError::Api {
                status: 500,
                message: format!("{project_slug} listing failed"),
            });
        }
        Ok(self.issues.get(project_slug).cloned().unwrap_or_default())
    }

    async fn capture_message(&self, message: &str, _level: Level) {
        self.captured.lock().unwrap().push(message.to_string());
    }
}
