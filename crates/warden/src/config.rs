//! Environment-derived service configuration.
//!
//! Built once at startup and passed by reference to every component.
//! Required settings fail fast with [`ConfigError`] before anything is
//! scheduled.

use std::path::PathBuf;

use thiserror::Error;

/// Default analysis schedule: every day at 02:00.
pub const DEFAULT_ANALYSIS_SCHEDULE: &str = "0 2 * * *";

/// Default lint schedule: every Monday at 01:00.
pub const DEFAULT_LINT_SCHEDULE: &str = "0 1 * * 1";

/// Default grammar linter binary, resolved via PATH.
pub const DEFAULT_LINTER_BIN: &str = "harper-cli";

/// Startup configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),
}

/// Immutable service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Installation token for the hosting API.
    pub github_token: String,
    /// Hosting API endpoint; overridable for tests.
    pub github_api_url: String,
    /// Bearer token for the error-monitor web API.
    pub sentry_token: String,
    /// Error-monitor organization slug.
    pub sentry_org: String,
    /// DSN for exception capture. Capture is disabled when unset.
    pub sentry_dsn: Option<String>,
    /// Error-monitor API endpoint; overridable for tests.
    pub sentry_api_url: String,
    /// Cron expression for the nightly analysis pipeline.
    pub analysis_schedule: String,
    /// Cron expression for the weekly lint pipeline.
    pub lint_schedule: String,
    /// Owner of the repository receiving the consolidated suggestions PR.
    pub target_owner: String,
    /// Name of the repository receiving the consolidated suggestions PR.
    pub target_repo: String,
    /// Grammar linter executable.
    pub linter_bin: PathBuf,
}

impl Config {
    /// Build configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            github_token: require("GITHUB_TOKEN")?,
            github_api_url: optional("GITHUB_API_URL")
                .unwrap_or_else(|| github_api::DEFAULT_API_URL.to_string()),
            sentry_token: require("SENTRY_TOKEN")?,
            sentry_org: require("SENTRY_ORG")?,
            sentry_dsn: optional("SENTRY_DSN"),
            sentry_api_url: optional("SENTRY_API_URL")
                .unwrap_or_else(|| sentry_api::DEFAULT_API_URL.to_string()),
            analysis_schedule: optional("ANALYSIS_CRON_SCHEDULE")
                .unwrap_or_else(|| DEFAULT_ANALYSIS_SCHEDULE.to_string()),
            lint_schedule: optional("LINT_CRON_SCHEDULE")
                .unwrap_or_else(|| DEFAULT_LINT_SCHEDULE.to_string()),
            target_owner: require("MAIN_REPO_OWNER")?,
            target_repo: require("MAIN_REPO_NAME")?,
            linter_bin: optional("HARPER_CLI_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_LINTER_BIN), PathBuf::from),
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::MissingVar(name))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
