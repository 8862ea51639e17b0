//! Cron-driven job scheduling.
//!
//! Each job runs on its own tokio task: sleep until the next occurrence of
//! the cron expression, run the callback, repeat. A failed tick is logged
//! and never halts the schedule. There is no catch-up for occurrences missed
//! while the process was down.

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use chrono::Utc;
use cron::Schedule;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Errors raised when a schedule cannot be created.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid cron expression '{expression}': {source}")]
    InvalidExpression {
        expression: String,
        #[source]
        source: cron::error::Error,
    },
}

/// Handle to a running schedule.
#[derive(Debug)]
pub struct JobHandle {
    name: String,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl JobHandle {
    /// Name the job was spawned with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stop the schedule (cancelling any in-flight tick) and wait for the
    /// task to wind down.
    pub async fn shutdown(self) {
        self.token.cancel();
        let _ = self.task.await;
    }

    /// Wait for the schedule to finish. It only finishes once its
    /// cancellation token fires.
    pub async fn stopped(self) {
        let _ = self.task.await;
    }
}

/// Parse `expression` and start invoking `job` at each matching tick.
///
/// Five-field expressions are accepted by prepending a seconds column;
/// six-field expressions pass through. Parsing happens eagerly so a bad
/// expression fails at startup, not at the first tick.
pub fn spawn_job<F, Fut>(
    name: impl Into<String>,
    expression: &str,
    token: CancellationToken,
    job: F,
) -> Result<JobHandle, ScheduleError>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    let normalized = normalize_expression(expression);
    let schedule =
        Schedule::from_str(&normalized).map_err(|source| ScheduleError::InvalidExpression {
            expression: expression.to_string(),
            source,
        })?;

    let name = name.into();
    let task_name = name.clone();
    let task_token = token.clone();
    let task = tokio::spawn(async move {
        run_schedule(&task_name, &schedule, &task_token, job).await;
    });

    Ok(JobHandle { name, token, task })
}

async fn run_schedule<F, Fut>(name: &str, schedule: &Schedule, token: &CancellationToken, job: F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = anyhow::Result<()>>,
{
    info!(job = name, "Schedule started");

    loop {
        let Some(next) = schedule.upcoming(Utc).next() else {
            info!(job = name, "No further occurrences; schedule finished");
            break;
        };
        let wait = (next - Utc::now()).to_std().unwrap_or(Duration::ZERO);
        debug!(job = name, next = %next, "Waiting for next tick");

        tokio::select! {
            () = token.cancelled() => {
                info!(job = name, "Schedule stopped");
                break;
            }
            () = tokio::time::sleep(wait) => {}
        }

        // One bad tick must never halt the schedule; shutdown abandons an
        // in-flight tick.
        tokio::select! {
            () = token.cancelled() => {
                info!(job = name, "Schedule stopped mid-tick");
                break;
            }
            result = job() => {
                if let Err(err) = result {
                    error!(job = name, error = %err, "Scheduled run failed");
                }
            }
        }
    }
}

/// Prepend a seconds column to five-field expressions.
fn normalize_expression(expression: &str) -> String {
    let expression = expression.trim();
    if expression.split_whitespace().count() == 5 {
        format!("0 {expression}")
    } else {
        expression.to_string()
    }
}
