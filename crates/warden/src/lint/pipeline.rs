//! Weekly documentation lint pipeline.
//!
//! Sweeps every accessible repository for top-level `.md`/`.txt` files,
//! runs them through the external grammar linter, and publishes one
//! consolidated document as a pull request against a fixed target
//! repository. A run with zero findings touches nothing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use github_api::models::Branch;
use github_api::GitHubApi;
use tracing::{debug, info};

use crate::error::PipelineError;
use crate::lint::harper::LintRunner;
use crate::lint::report::{render_report, FileReport, REPORT_TITLE};
use crate::retry::{retry, RetryPolicy};

/// Path of the consolidated document inside the target repository.
pub const SUGGESTIONS_PATH: &str = "grammar-suggestions.md";

const BRANCH_PREFIX: &str = "grammar-fixes";
const COMMIT_MESSAGE: &str = "Weekly grammar suggestions";

/// Outcome of one lint run.
#[derive(Debug, Default)]
pub struct LintRunSummary {
    /// Repositories swept.
    pub repositories: usize,
    /// Text documents checked.
    pub files_checked: usize,
    /// Total findings collected.
    pub findings: usize,
    /// URL of the opened pull request, when findings existed.
    pub pull_request: Option<String>,
}

/// Weekly lint sweep and consolidated pull request.
pub struct LintPipeline {
    github: Arc<dyn GitHubApi>,
    runner: LintRunner,
    target_owner: String,
    target_repo: String,
    retry_policy: RetryPolicy,
}

impl LintPipeline {
    /// Create a new pipeline publishing to `target_owner/target_repo`.
    #[must_use]
    pub fn new(
        github: Arc<dyn GitHubApi>,
        runner: LintRunner,
        target_owner: impl Into<String>,
        target_repo: impl Into<String>,
    ) -> Self {
        Self {
            github,
            runner,
            target_owner: target_owner.into(),
            target_repo: target_repo.into(),
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Override the retry policy (tests shrink the delays).
    #[must_use]
    pub fn with_retry_policy(self, retry_policy: RetryPolicy) -> Self {
        Self {
            retry_policy,
            ..self
        }
    }

    /// Run a full lint sweep.
    pub async fn run(&self) -> Result<LintRunSummary, PipelineError> {
        info!("Starting documentation lint sweep");

        let repos = retry("list repositories", self.retry_policy, || {
            self.github.list_repositories()
        })
        .await
        .map_err(|e| PipelineError::lint("listing accessible repositories", &e))?;

        let mut summary = LintRunSummary::default();
        let mut reports: Vec<FileReport> = Vec::new();

        for repo in &repos {
            let owner = &repo.owner.login;
            let entries = retry("list repository contents", self.retry_policy, || {
                self.github.get_directory(owner, &repo.name, "")
            })
            .await
            .map_err(|e| {
                PipelineError::lint(&format!("listing contents of {}", repo.slug()), &e)
            })?;
            summary.repositories += 1;

            for entry in entries
                .iter()
                .filter(|e| e.is_file() && is_text_document(&e.name))
            {
                let content = retry("fetch file content", self.retry_policy, || {
                    self.github.get_file_text(owner, &repo.name, &entry.path)
                })
                .await
                .map_err(|e| {
                    PipelineError::lint(
                        &format!("fetching {} from {}", entry.path, repo.slug()),
                        &e,
                    )
                })?;
                summary.files_checked += 1;

                let findings = self.runner.lint_text(&content).await;
                if findings.is_empty() {
                    continue;
                }

                debug!(
                    repo = %repo.slug(),
                    file = %entry.name,
                    findings = findings.len(),
                    "Collected findings"
                );
                summary.findings += findings.len();
                reports.push(FileReport {
                    repository: repo.name.clone(),
                    file: entry.name.clone(),
                    findings,
                });
            }
        }

        if reports.is_empty() {
            info!(
                repositories = summary.repositories,
                files_checked = summary.files_checked,
                "No grammar suggestions found this week"
            );
            return Ok(summary);
        }

        let url = self.open_pull_request(&reports).await?;
        info!(
            findings = summary.findings,
            pull_request = %url,
            "Lint sweep complete"
        );
        summary.pull_request = Some(url);
        Ok(summary)
    }

    /// Publish the consolidated document on a fresh branch and open the PR.
    async fn open_pull_request(&self, reports: &[FileReport]) -> Result<String, PipelineError> {
        let owner = &self.target_owner;
        let repo = &self.target_repo;

        let target = retry("get target repository", self.retry_policy, || {
            self.github.get_repository(owner, repo)
        })
        .await
        .map_err(|e| PipelineError::pull_request("fetching target repository", &e))?;
        let default_branch =
            target
                .default_branch
                .ok_or_else(|| PipelineError::PullRequestCreationFailed {
                    status: 500,
                    message: format!("{owner}/{repo} reports no default branch"),
                })?;

        let branches = retry("list branches", self.retry_policy, || {
            self.github.list_branches(owner, repo)
        })
        .await
        .map_err(|e| PipelineError::pull_request("listing target branches", &e))?;
        let head_sha = branches
            .iter()
            .find(|b| b.name == default_branch)
            .map(|b| b.commit.sha.clone())
            .ok_or_else(|| PipelineError::PullRequestCreationFailed {
                status: 500,
                message: format!("default branch {default_branch} not in branch listing"),
            })?;

        let branch = unique_branch_name(&branches, Utc::now());
        retry("create branch", self.retry_policy, || {
            self.github.create_branch(owner, repo, &branch, &head_sha)
        })
        .await
        .map_err(|e| PipelineError::pull_request(&format!("creating branch {branch}"), &e))?;

        let body = render_report(reports);
        retry("write suggestions document", self.retry_policy, || {
            self.github
                .create_or_update_file(owner, repo, SUGGESTIONS_PATH, &body, COMMIT_MESSAGE, &branch)
        })
        .await
        .map_err(|e| {
            PipelineError::pull_request(&format!("writing {SUGGESTIONS_PATH} on {branch}"), &e)
        })?;

        let pr = retry("create pull request", self.retry_policy, || {
            self.github
                .create_pull_request(owner, repo, REPORT_TITLE, &body, &branch, &default_branch)
        })
        .await
        .map_err(|e| PipelineError::pull_request("opening weekly suggestions PR", &e))?;

        info!(owner, repo, number = pr.number, branch = %branch, "Opened weekly suggestions pull request");
        Ok(pr
            .html_url
            .clone()
            .unwrap_or_else(|| format!("{owner}/{repo}#{}", pr.number)))
    }
}

/// Branch name for this run. The date-based name collides when a run is
/// re-triggered on the same day; those get a time suffix.
fn unique_branch_name(branches: &[Branch], now: DateTime<Utc>) -> String {
    let dated = format!("{BRANCH_PREFIX}-{}", now.format("%Y-%m-%d"));
    if branches.iter().any(|b| b.name == dated) {
        format!("{dated}-{}", now.format("%H%M%S"))
    } else {
        dated
    }
}

fn is_text_document(name: &str) -> bool {
    name.ends_with(".md") || name.ends_with(".txt")
}
