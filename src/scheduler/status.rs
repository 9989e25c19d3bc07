use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::stream::{self, BoxStream};

use crate::foundation::error::PipelineResult;
use crate::scheduler::registry::TaskRegistry;
use crate::scheduler::task::{OwnerId, TaskSnapshot};

/// Read-side view of the registry for frontends.
#[derive(Clone, Debug)]
pub struct StatusPublisher {
    registry: Arc<TaskRegistry>,
    poll_interval: Duration,
}

enum WatchState {
    Start,
    Polling(tokio::time::Interval),
    Done,
}

impl StatusPublisher {
    /// Publisher polling `registry` every `poll_interval`.
    pub fn new(registry: Arc<TaskRegistry>, poll_interval: Duration) -> Self {
        Self {
            registry,
            poll_interval,
        }
    }

    /// Current tasks of `owner`, oldest first.
    pub fn list_tasks(&self, owner: &OwnerId) -> Vec<TaskSnapshot> {
        self.registry.snapshot(owner)
    }

    /// Stream of snapshot sets: one immediately, then one per poll interval while any task of
    /// `owner` is Pending or Processing, ending after the first set with no active task.
    pub fn watch(&self, owner: OwnerId) -> BoxStream<'static, Vec<TaskSnapshot>> {
        let registry = self.registry.clone();
        let period = self.poll_interval;
        stream::unfold(WatchState::Start, move |state| {
            let registry = registry.clone();
            let owner = owner.clone();
            async move {
                let mut interval = match state {
                    WatchState::Done => return None,
                    WatchState::Start => {
                        let mut interval = tokio::time::interval(period);
                        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
                        interval
                    }
                    WatchState::Polling(interval) => interval,
                };
                interval.tick().await;
                let snapshot = registry.snapshot(&owner);
                let next = if snapshot.iter().any(|s| s.status.is_active()) {
                    WatchState::Polling(interval)
                } else {
                    WatchState::Done
                };
                Some((snapshot, next))
            }
        })
        .boxed()
    }
}

/// Format one snapshot set as a server-sent-events `data:` frame.
pub fn sse_event(snapshots: &[TaskSnapshot]) -> PipelineResult<String> {
    use anyhow::Context as _;
    let json = serde_json::to_string(snapshots).context("serialize task snapshots")?;
    Ok(format!("data: {json}\n\n"))
}

#[cfg(test)]
#[path = "../../tests/unit/scheduler/status.rs"]
mod tests;
