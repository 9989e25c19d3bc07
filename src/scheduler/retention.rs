use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::foundation::error::PipelineResult;
use crate::scheduler::registry::TaskRegistry;
use crate::scheduler::storage::ArtifactStore;
use crate::scheduler::task::{OwnerId, TaskKey};

/// Default interval between periodic sweeps (60 seconds).
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// How long finished work is kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Terminal tasks kept per owner; older ones are evicted.
    pub retained_per_owner: usize,
    /// Terminal records and inactive files older than this are deleted.
    pub max_age: Duration,
    /// Period of the background sweep.
    pub sweep_interval: Duration,
}

/// Counters from one age sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Registry records removed.
    pub records: usize,
    /// Files deleted.
    pub files: usize,
}

/// Reclaims records and artifacts of finished tasks.
#[derive(Clone, Debug)]
pub struct RetentionSweeper {
    registry: Arc<TaskRegistry>,
    store: Arc<ArtifactStore>,
    policy: RetentionPolicy,
}

impl RetentionSweeper {
    /// Sweeper over `registry` and `store`.
    pub fn new(
        registry: Arc<TaskRegistry>,
        store: Arc<ArtifactStore>,
        policy: RetentionPolicy,
    ) -> Self {
        Self {
            registry,
            store,
            policy,
        }
    }

    /// Configured policy.
    pub fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    /// Count rule: keep only the newest `retained_per_owner` terminal tasks of `owner`.
    pub fn sweep_owner(&self, owner: &OwnerId) -> usize {
        let evicted = self
            .registry
            .evict_excess_terminal(owner, self.policy.retained_per_owner);
        for key in &evicted {
            let files = self.store.remove_all(key);
            debug!(owner = %key.owner, task = %key.task, files, "evicted task beyond retention count");
        }
        evicted.len()
    }

    /// Age rule: drop stale terminal records, then stale files of tasks that are not active.
    pub fn sweep_aged(&self) -> PipelineResult<SweepStats> {
        let mut stats = SweepStats::default();
        let max_age = chrono::Duration::from_std(self.policy.max_age)
            .unwrap_or(chrono::Duration::MAX);
        let cutoff = chrono::Utc::now()
            .checked_sub_signed(max_age)
            .unwrap_or(chrono::DateTime::<chrono::Utc>::MIN_UTC);
        for key in self.registry.evict_terminal_before(cutoff) {
            stats.files += self.store.remove_all(&key);
            stats.records += 1;
        }

        let files = self.store.scan()?;
        let now = SystemTime::now();
        let max_age = self.policy.max_age;
        stats.files += self.registry.with_active(|is_active| {
            files
                .iter()
                .filter(|f| now.duration_since(f.modified).unwrap_or_default() > max_age)
                .filter(|f| !f.key.as_ref().is_some_and(is_active))
                .filter(|f| std::fs::remove_file(&f.path).is_ok())
                .count()
        });

        if stats.records > 0 || stats.files > 0 {
            info!(
                records = stats.records,
                files = stats.files,
                "retention sweep removed stale work"
            );
        }
        Ok(stats)
    }

    /// Delete a delivered task. Only terminal tasks are released.
    pub fn release(&self, key: &TaskKey) -> bool {
        if self.registry.remove_terminal(key).is_none() {
            return false;
        }
        let files = self.store.remove_all(key);
        debug!(owner = %key.owner, task = %key.task, files, "released task");
        true
    }

    /// Runs the periodic age sweep until cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.policy.sweep_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => {}
            }
            if let Err(e) = self.sweep_aged() {
                warn!(error = %e, "retention sweep failed");
            }
        }
        debug!("retention sweeper stopped");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scheduler/retention.rs"]
mod tests;
