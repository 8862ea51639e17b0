//! Nightly repository analysis.
//!
//! Classifies monitor issues per repository, files issues for critical
//! ones, flags oversized or critical-path pull requests, and surfaces
//! failing workflows.

mod classify;
mod pipeline;

pub use classify::{
    classify_issues, review_message, summarize_pull_request, FrequentIssue, PullRequestSummary,
    SeverityStats,
};
pub use pipeline::{AnalysisPipeline, AnalysisRunSummary};
