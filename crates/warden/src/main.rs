//! warden CLI - repository health monitor.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use github_api::{GitHubApi, GitHubClient};
use sentry_api::{ErrorMonitor, ErrorReporter, SentryClient};
use warden::analysis::{AnalysisPipeline, AnalysisRunSummary};
use warden::config::Config;
use warden::lint::{LintPipeline, LintRunSummary, LintRunner};
use warden::schedule::spawn_job;

/// Repository health monitor - turns error-monitor and docs signals into
/// issues and pull requests.
#[derive(Parser)]
#[command(name = "warden")]
#[command(about = "Repository health monitor - files issues and PRs from error and docs signals")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run both pipelines on their cron schedules until interrupted
    Run,
    /// Run a single repository analysis pass
    Analyze,
    /// Run a single documentation lint sweep
    Lint,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("warden=debug,github_api=debug,sentry_api=debug,info")
    } else {
        EnvFilter::new("warden=info,warn")
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = Config::from_env().context("configuration is incomplete")?;

    let github: Arc<dyn GitHubApi> = Arc::new(
        GitHubClient::new(&config.github_token, config.github_api_url.clone())
            .context("failed to build GitHub client")?,
    );
    let sentry: Arc<dyn ErrorMonitor> = Arc::new(build_sentry(&config)?);

    match cli.command {
        Commands::Run => run_service(&config, github, sentry).await,
        Commands::Analyze => {
            let summary = AnalysisPipeline::new(github, sentry).run().await?;
            print_analysis_summary(&summary);
            Ok(())
        }
        Commands::Lint => {
            let runner = LintRunner::new(config.linter_bin.clone());
            runner
                .verify_installation()
                .await
                .context("grammar linter is not available")?;
            let summary = LintPipeline::new(
                github,
                runner,
                config.target_owner.clone(),
                config.target_repo.clone(),
            )
            .run()
            .await?;
            print_lint_summary(&summary);
            Ok(())
        }
    }
}

fn build_sentry(config: &Config) -> Result<SentryClient> {
    let client = SentryClient::new(
        config.sentry_api_url.clone(),
        config.sentry_token.clone(),
        config.sentry_org.clone(),
    )
    .context("failed to build Sentry client")?;

    match &config.sentry_dsn {
        Some(dsn) => {
            let reporter = ErrorReporter::new(dsn).context("SENTRY_DSN is not a valid DSN")?;
            Ok(client.with_reporter(reporter))
        }
        None => {
            warn!("SENTRY_DSN not set; exception capture disabled");
            Ok(client)
        }
    }
}

async fn run_service(
    config: &Config,
    github: Arc<dyn GitHubApi>,
    sentry: Arc<dyn ErrorMonitor>,
) -> Result<()> {
    let runner = LintRunner::new(config.linter_bin.clone());
    runner
        .verify_installation()
        .await
        .context("grammar linter is not available")?;

    let analysis = Arc::new(AnalysisPipeline::new(github.clone(), sentry));
    let lint = Arc::new(LintPipeline::new(
        github,
        runner,
        config.target_owner.clone(),
        config.target_repo.clone(),
    ));

    let token = CancellationToken::new();

    let lint_job = {
        let lint = lint.clone();
        spawn_job(
            "lint",
            &config.lint_schedule,
            token.child_token(),
            move || {
                let lint = lint.clone();
                async move {
                    let summary = lint.run().await?;
                    info!(
                        files_checked = summary.files_checked,
                        findings = summary.findings,
                        "Weekly lint tick complete"
                    );
                    Ok(())
                }
            },
        )
        .context("invalid lint schedule")?
    };
    info!(schedule = %config.lint_schedule, "Lint service started; weekly grammar checks scheduled");

    let analysis_job = {
        let analysis = analysis.clone();
        spawn_job(
            "analysis",
            &config.analysis_schedule,
            token.child_token(),
            move || {
                let analysis = analysis.clone();
                async move {
                    let summary = analysis.run().await?;
                    info!(
                        repositories = summary.repositories,
                        issues_filed = summary.issues_filed,
                        "Nightly analysis tick complete"
                    );
                    Ok(())
                }
            },
        )
        .context("invalid analysis schedule")?
    };
    info!(schedule = %config.analysis_schedule, "Analysis service started");

    // First analysis pass runs at startup, not just at the next tick.
    if let Err(err) = analysis.run().await {
        error!(error = %err, "Initial analysis pass failed");
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutting down gracefully");
    token.cancel();
    analysis_job.shutdown().await;
    lint_job.shutdown().await;

    Ok(())
}

fn print_analysis_summary(summary: &AnalysisRunSummary) {
    println!("\nAnalysis summary");
    println!("   Repositories analyzed: {}", summary.repositories);
    println!("   Issues filed: {}", summary.issues_filed);
    println!("   Reviews posted: {}", summary.reviews_posted);
    println!("   Workflows with failures: {}", summary.failing_workflows);

    if !summary.failures.is_empty() {
        println!("   Failures: {}", summary.failures.len());
        for failure in &summary.failures {
            eprintln!("     - {failure}");
        }
    }
}

fn print_lint_summary(summary: &LintRunSummary) {
    println!("\nLint summary");
    println!("   Repositories swept: {}", summary.repositories);
    println!("   Files checked: {}", summary.files_checked);
    println!("   Findings: {}", summary.findings);
    match &summary.pull_request {
        Some(url) => println!("   Pull request: {url}"),
        None => println!("   No pull request opened"),
    }
}
