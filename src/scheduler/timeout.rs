use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::warn;

use crate::scheduler::registry::TaskRegistry;
use crate::scheduler::task::{TaskKey, TaskStatus};

/// Forces over-long tasks into Timeout and cancels their work.
#[derive(Clone, Debug)]
pub struct TimeoutSupervisor {
    registry: Arc<TaskRegistry>,
    ceiling: Duration,
}

/// Disarms the timer when dropped.
#[derive(Debug)]
pub struct TimeoutGuard {
    _disarm: DropGuard,
}

impl TimeoutSupervisor {
    /// Supervisor moving tasks in `registry` to Timeout after `ceiling`.
    pub fn new(registry: Arc<TaskRegistry>, ceiling: Duration) -> Self {
        Self { registry, ceiling }
    }

    /// Configured ceiling.
    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }

    /// Start the timer for a task that just entered Processing.
    ///
    /// If the ceiling elapses before the guard is dropped, the task moves Processing→Timeout and
    /// `cancel` fires. Must be called from within a tokio runtime.
    pub fn arm(&self, key: TaskKey, cancel: CancellationToken) -> TimeoutGuard {
        let disarm = CancellationToken::new();
        let fired = disarm.clone();
        let registry = self.registry.clone();
        let ceiling = self.ceiling;

        tokio::spawn(async move {
            tokio::select! {
                _ = fired.cancelled() => {}
                _ = tokio::time::sleep(ceiling) => {
                    let msg = format!("processing exceeded {:.1}s", ceiling.as_secs_f64());
                    if registry.transition(
                        &key,
                        TaskStatus::Processing,
                        TaskStatus::Timeout,
                        Some(msg),
                    ) {
                        warn!(owner = %key.owner, task = %key.task, "task timed out");
                        cancel.cancel();
                    }
                }
            }
        });

        TimeoutGuard {
            _disarm: disarm.drop_guard(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scheduler/timeout.rs"]
mod tests;
