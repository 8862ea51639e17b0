//! Pure classification of monitor issues and pull requests.

use github_api::models::{PullRequest, PullRequestFile};
use sentry_api::models::{Level, SentryIssue};

/// How many top issues to consider for filing.
const TOP_ISSUES: usize = 5;

/// Combined line-change count above which a pull request is "large".
const LARGE_CHANGE_THRESHOLD: u64 = 1000;

/// Filename fragments that mark a change as touching critical paths.
/// Matched case-sensitively, anywhere in the path.
const CRITICAL_FRAGMENTS: [&str; 2] = ["config", "security"];

/// Aggregate severity statistics for one repository's monitor issues.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeverityStats {
    /// Fatal and critical issues combined.
    pub critical: usize,
    pub error: usize,
    pub warning: usize,
    /// Top issues by occurrence count, descending, response order on ties.
    pub most_frequent: Vec<FrequentIssue>,
}

/// One entry of the most-frequent ranking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequentIssue {
    pub title: String,
    pub count: u64,
    pub level: Level,
}

/// Bucket issues by severity and rank the most frequent ones.
#[must_use]
pub fn classify_issues(issues: &[SentryIssue]) -> SeverityStats {
    let mut stats = SeverityStats::default();
    for issue in issues {
        match issue.level {
            Level::Fatal | Level::Critical => stats.critical += 1,
            Level::Error => stats.error += 1,
            Level::Warning => stats.warning += 1,
            Level::Info | Level::Unknown => {}
        }
    }

    let mut ranked: Vec<&SentryIssue> = issues.iter().collect();
    // Stable sort keeps response order for equal counts.
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    stats.most_frequent = ranked
        .into_iter()
        .take(TOP_ISSUES)
        .map(|issue| FrequentIssue {
            title: issue.title.clone(),
            count: issue.count,
            level: issue.level,
        })
        .collect();

    stats
}

/// Derived shape of one open pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestSummary {
    pub number: u64,
    pub changed_files: usize,
    pub additions: u64,
    pub deletions: u64,
    pub is_large: bool,
    pub touches_critical_files: bool,
}

/// Summarize a pull request from its detail record and changed files.
#[must_use]
pub fn summarize_pull_request(pr: &PullRequest, files: &[PullRequestFile]) -> PullRequestSummary {
    let additions = pr.additions.unwrap_or(0);
    let deletions = pr.deletions.unwrap_or(0);
    PullRequestSummary {
        number: pr.number,
        changed_files: files.len(),
        additions,
        deletions,
        is_large: additions + deletions > LARGE_CHANGE_THRESHOLD,
        touches_critical_files: files.iter().any(|file| {
            CRITICAL_FRAGMENTS
                .iter()
                .any(|fragment| file.filename.contains(fragment))
        }),
    }
}

/// Review text for a flagged pull request; `None` when nothing fired.
#[must_use]
pub fn review_message(summary: &PullRequestSummary) -> Option<String> {
    let text = match (summary.is_large, summary.touches_critical_files) {
        (true, true) => {
            "This pull request is quite large and touches critical files. Please ensure thorough review."
        }
        (true, false) => "This pull request is quite large. Please ensure thorough review.",
        (false, true) => {
            "This pull request touches critical files. Please ensure thorough review."
        }
        (false, false) => return None,
    };
    Some(text.to_string())
}
