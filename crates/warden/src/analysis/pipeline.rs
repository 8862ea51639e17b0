//! Nightly repository analysis pipeline.
//!
//! Per run: list accessible repositories, then for each one fetch repository
//! metadata, monitor issues, open pull requests and workflows concurrently,
//! classify, and act. Repositories are isolated from each other: one failed
//! analysis is reported and the loop moves on.

use std::collections::HashSet;
use std::sync::Arc;

use github_api::{GitHubApi, PullRequestState, ReviewEvent};
use sentry_api::models::Level;
use sentry_api::ErrorMonitor;
use tracing::{debug, error, info, warn};

use crate::analysis::classify::{classify_issues, review_message, summarize_pull_request, FrequentIssue};
use crate::error::PipelineError;
use crate::retry::{retry, RetryPolicy};

/// Outcome of one analysis run.
#[derive(Debug, Default)]
pub struct AnalysisRunSummary {
    /// Repositories analyzed without error.
    pub repositories: usize,
    /// Hosting issues filed for critical monitor issues.
    pub issues_filed: usize,
    /// Review comments posted on flagged pull requests.
    pub reviews_posted: usize,
    /// Workflows observed with at least one failing run.
    pub failing_workflows: usize,
    /// Per-repository failures, as `owner/name: error`.
    pub failures: Vec<String>,
}

struct RepoOutcome {
    issues_filed: usize,
    reviews_posted: usize,
    failing_workflows: usize,
}

/// Nightly analysis over every accessible repository.
pub struct AnalysisPipeline {
    github: Arc<dyn GitHubApi>,
    monitor: Arc<dyn ErrorMonitor>,
    retry_policy: RetryPolicy,
}

impl AnalysisPipeline {
    /// Create a new pipeline.
    #[must_use]
    pub fn new(github: Arc<dyn GitHubApi>, monitor: Arc<dyn ErrorMonitor>) -> Self {
        Self {
            github,
            monitor,
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

    /// Run a full analysis pass.
    pub async fn run(&self) -> Result<AnalysisRunSummary, PipelineError> {
        info!("Starting repository analysis");

        let repos = match retry("list repositories", self.retry_policy, || {
            self.github.list_repositories()
        })
        .await
        {
            Ok(repos) => repos,
            Err(err) => {
                let err = PipelineError::analysis("listing accessible repositories", &err);
                self.monitor.capture_message(&err.to_string(), Level::Error).await;
                return Err(err);
            }
        };

        let mut summary = AnalysisRunSummary::default();
        for repo in &repos {
            match self.analyze_repository(&repo.owner.login, &repo.name).await {
                Ok(outcome) => {
                    summary.repositories += 1;
                    summary.issues_filed += outcome.issues_filed;
                    summary.reviews_posted += outcome.reviews_posted;
                    summary.failing_workflows += outcome.failing_workflows;
                }
                Err(err) => {
                    error!(repo = %repo.slug(), error = %err, "Repository analysis failed");
                    self.monitor.capture_message(&err.to_string(), Level::Error).await;
                    summary.failures.push(format!("{}: {err}", repo.slug()));
                }
            }
        }

        info!(
            repositories = summary.repositories,
            issues_filed = summary.issues_filed,
            reviews_posted = summary.reviews_posted,
            failing_workflows = summary.failing_workflows,
            failures = summary.failures.len(),
            "Analysis run complete"
        );
        Ok(summary)
    }

    async fn analyze_repository(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<RepoOutcome, PipelineError> {
        info!(owner, repo, "Analyzing repository");
        let project_slug = format!("{owner}-{repo}");

        // The four fetches have no ordering dependency.
        let (repo_result, issues_result, pulls_result, workflows_result) = tokio::join!(
            retry("get repository", self.retry_policy, || {
                self.github.get_repository(owner, repo)
            }),
            self.monitor.project_issues(&project_slug),
            retry("list pull requests", self.retry_policy, || {
                self.github
                    .list_pull_requests(owner, repo, PullRequestState::Open)
            }),
            retry("list workflows", self.retry_policy, || {
                self.github.list_workflows(owner, repo)
            }),
        );

        let repo_data =
            repo_result.map_err(|e| PipelineError::analysis(&format!("fetching {owner}/{repo}"), &e))?;
        let pulls = pulls_result.map_err(|e| {
            PipelineError::analysis(&format!("listing pull requests of {owner}/{repo}"), &e)
        })?;
        let workflows = workflows_result.map_err(|e| {
            PipelineError::analysis(&format!("listing workflows of {owner}/{repo}"), &e)
        })?;
        // A monitor outage degrades to an empty listing, like the upstream
        // project being absent entirely.
        let issues = match issues_result {
            Ok(issues) => issues,
            Err(err) => {
                warn!(project = %project_slug, error = %err, "Failed to fetch monitor issues; treating as empty");
                Vec::new()
            }
        };

        let stats = classify_issues(&issues);
        debug!(
            repo = %repo_data.slug(),
            critical = stats.critical,
            error = stats.error,
            warning = stats.warning,
            "Classified monitor issues"
        );

        let issues_filed = self
            .file_critical_issues(owner, repo, &stats.most_frequent)
            .await?;
        let reviews_posted = self.review_pull_requests(owner, repo, &pulls).await?;
        let failing_workflows = self.check_workflows(owner, repo, &workflows).await?;

        info!(repo = %repo_data.slug(), "Analysis completed");
        Ok(RepoOutcome {
            issues_filed,
            reviews_posted,
            failing_workflows,
        })
    }

    /// File a hosting issue for each critical entry of the frequency ranking,
    /// skipping titles that already have an open issue.
    async fn file_critical_issues(
        &self,
        owner: &str,
        repo: &str,
        most_frequent: &[FrequentIssue],
    ) -> Result<usize, PipelineError> {
        let critical: Vec<&FrequentIssue> = most_frequent
            .iter()
            .filter(|issue| issue.level.is_critical())
            .collect();
        if critical.is_empty() {
            return Ok(0);
        }

        let existing = retry("list issues", self.retry_policy, || {
            self.github.list_issues(owner, repo)
        })
        .await
        .map_err(|e| PipelineError::analysis(&format!("listing issues of {owner}/{repo}"), &e))?;
        let open_titles: HashSet<&str> = existing
            .iter()
            .filter(|issue| issue.state == "open")
            .map(|issue| issue.title.as_str())
            .collect();

        let mut filed = 0;
        for issue in critical {
            let title = format!("[Critical] Sentry issue: {}", issue.title);
            if open_titles.contains(title.as_str()) {
                debug!(owner, repo, title = %issue.title, "Issue already filed; skipping");
                continue;
            }

            let body = format!(
                "A critical issue has been detected by Sentry.\n\n\
                 Title: {}\n\
                 Level: {}\n\
                 Occurrences: {}\n\n\
                 Please investigate and resolve this issue as soon as possible.",
                issue.title, issue.level, issue.count
            );
            retry("create issue", self.retry_policy, || {
                self.github.create_issue(owner, repo, &title, &body)
            })
            .await
            .map_err(|e| {
                PipelineError::analysis(&format!("filing issue on {owner}/{repo}"), &e)
            })?;

            info!(owner, repo, title = %issue.title, count = issue.count, "Filed issue for critical monitor issue");
            filed += 1;
        }
        Ok(filed)
    }

    /// Post a review comment on oversized or critical-path pull requests.
    async fn review_pull_requests(
        &self,
        owner: &str,
        repo: &str,
        pulls: &[github_api::models::PullRequest],
    ) -> Result<usize, PipelineError> {
        let mut posted = 0;
        for pr in pulls {
            let files = retry("list pull request files", self.retry_policy, || {
                self.github.list_pull_request_files(owner, repo, pr.number)
            })
            .await
            .map_err(|e| {
                PipelineError::analysis(&format!("listing files of {owner}/{repo}#{}", pr.number), &e)
            })?;
            // The listing omits size counters; only the detail endpoint has them.
            let detail = retry("get pull request", self.retry_policy, || {
                self.github.get_pull_request(owner, repo, pr.number)
            })
            .await
            .map_err(|e| {
                PipelineError::analysis(&format!("fetching {owner}/{repo}#{}", pr.number), &e)
            })?;

            let summary = summarize_pull_request(&detail, &files);
            let Some(message) = review_message(&summary) else {
                continue;
            };

            retry("create pull request review", self.retry_policy, || {
                self.github
                    .create_pull_request_review(owner, repo, pr.number, &message, ReviewEvent::Comment)
            })
            .await
            .map_err(|e| {
                PipelineError::analysis(&format!("reviewing {owner}/{repo}#{}", pr.number), &e)
            })?;

            info!(
                owner,
                repo,
                number = pr.number,
                large = summary.is_large,
                critical_files = summary.touches_critical_files,
                "Posted review comment on flagged pull request"
            );
            posted += 1;
        }
        Ok(posted)
    }

    /// Log a warning for every workflow with failing runs. Observation only;
    /// no remediation is triggered.
    async fn check_workflows(
        &self,
        owner: &str,
        repo: &str,
        workflows: &[github_api::models::Workflow],
    ) -> Result<usize, PipelineError> {
        let mut failing = 0;
        for workflow in workflows {
            let runs = retry("list workflow runs", self.retry_policy, || {
                self.github.list_workflow_runs(owner, repo, workflow.id)
            })
            .await
            .map_err(|e| {
                PipelineError::analysis(
                    &format!("listing runs of workflow {} in {owner}/{repo}", workflow.name),
                    &e,
                )
            })?;

            let failed = runs
                .iter()
                .filter(|run| run.conclusion.as_deref() == Some("failure"))
                .count();
            if failed > 0 {
                warn!(
                    owner,
                    repo,
                    workflow = %workflow.name,
                    failed_runs = failed,
                    "Workflow has failing runs"
                );
                failing += 1;
            }
        }
        Ok(failing)
    }
}
