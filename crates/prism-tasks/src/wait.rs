//! Polling a task to a terminal state.

use prism_core::Error;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::models::{Task, TaskStatus};
use crate::Result;

/// Default delay between two polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default upper bound on a wait
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2100);

/// Anything that can read a task record.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TaskSource: Send + Sync {
    /// Fetches the current record of a task.
    async fn get_task(&self, task_ext_id: &str) -> Result<Task>;
}

/// Bounded task poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskWaiter {
    poll_interval: Duration,
    timeout: Duration,
}

impl Default for TaskWaiter {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskWaiter {
    /// A waiter with the default poll interval and timeout.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Return the timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Polls until the task reaches a terminal state.
    ///
    /// # Errors
    ///
    /// - [`Error::TaskFailed`] when the task ends FAILED or CANCELED
    /// - [`Error::TaskTimeout`] when no terminal state is seen in time, carrying
    ///   the last observed record
    /// - any error of the source, unchanged (polls are not retried)
    pub async fn wait_for_completion<S>(&self, source: &S, task_ext_id: &str) -> Result<Task>
    where
        S: TaskSource + ?Sized,
    {
        let started = Instant::now();
        let mut last_progress: u32 = 0;

        loop {
            let task = source.get_task(task_ext_id).await?;

            if let Some(progress) = task.progress_percentage {
                if progress < last_progress {
                    warn!(
                        task = task_ext_id,
                        progress, last_progress, "task progress went backwards, ignoring"
                    );
                } else {
                    last_progress = progress;
                }
            }
            debug!(
                task = task_ext_id,
                status = %task.status,
                progress = last_progress,
                "polled task"
            );

            match task.status {
                TaskStatus::Succeeded => return Ok(task),
                TaskStatus::Failed | TaskStatus::Canceled => {
                    return Err(Error::TaskFailed {
                        task_ext_id: task_ext_id.to_string(),
                        status: task.status.to_string(),
                        messages: task.messages(),
                    });
                }
                TaskStatus::Pending | TaskStatus::Running | TaskStatus::Other(_) => {}
            }

            let elapsed = started.elapsed();
            if elapsed >= self.timeout {
                return Err(Error::TaskTimeout {
                    task_ext_id: task_ext_id.to_string(),
                    waited_secs: elapsed.as_secs(),
                    last_observed: serde_json::to_value(&task).ok(),
                });
            }

            let remaining = self.timeout.saturating_sub(elapsed);
            tokio::time::sleep(self.poll_interval.min(remaining)).await;
        }
    }
}
