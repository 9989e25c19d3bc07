//! Authoritative in-memory task table.
//!
//! Every read-modify-write happens under one `parking_lot::Mutex`. The map itself is never
//! handed out: callers get atomic operations and cloned records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::foundation::error::PipelineResult;
use crate::render::compositor::RenderParams;
use crate::scheduler::task::{OwnerId, TaskId, TaskKey, TaskRecord, TaskSnapshot, TaskStatus};

/// Counts visible to an admission check while the registry lock is held.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdmissionView {
    /// Pending + Processing tasks of the submitting owner.
    pub owner_active: usize,
    /// Pending tasks across all owners.
    pub pending_total: usize,
    /// Whether the key is already registered.
    pub exists: bool,
}

/// Result of [`TaskRegistry::finish_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishOutcome {
    /// The publish step ran and the task is now Completed.
    Completed,
    /// The publish step ran and failed; the task is now Error.
    Failed(String),
    /// The task was no longer Processing; nothing ran.
    Skipped(Option<TaskStatus>),
}

#[derive(Debug, Default)]
struct RegistryState {
    owners: BTreeMap<OwnerId, BTreeMap<TaskId, TaskRecord>>,
    next_seq: u64,
}

impl RegistryState {
    fn get_mut(&mut self, key: &TaskKey) -> Option<&mut TaskRecord> {
        self.owners.get_mut(&key.owner)?.get_mut(&key.task)
    }

    fn get(&self, key: &TaskKey) -> Option<&TaskRecord> {
        self.owners.get(&key.owner)?.get(&key.task)
    }

    fn remove(&mut self, key: &TaskKey) -> Option<TaskRecord> {
        let tasks = self.owners.get_mut(&key.owner)?;
        let rec = tasks.remove(&key.task);
        if tasks.is_empty() {
            self.owners.remove(&key.owner);
        }
        rec
    }

    fn records(&self) -> impl Iterator<Item = &TaskRecord> {
        self.owners.values().flat_map(|tasks| tasks.values())
    }
}

fn set_status(rec: &mut TaskRecord, next: TaskStatus, message: Option<String>) {
    rec.status = next;
    if message.is_some() {
        rec.message = message;
    }
    rec.updated_at = Utc::now();
}

/// Owner → task → record table.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    state: Mutex<RegistryState>,
}

impl TaskRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `check` against current counts and insert a Pending record if it passes.
    ///
    /// Check and insert happen under a single lock acquisition.
    pub fn admit_with<E>(
        &self,
        key: TaskKey,
        params: RenderParams,
        check: impl FnOnce(AdmissionView) -> Result<(), E>,
    ) -> Result<(), E> {
        let mut state = self.state.lock();
        let owner_active = state
            .owners
            .get(&key.owner)
            .map(|tasks| tasks.values().filter(|r| r.status.is_active()).count())
            .unwrap_or(0);
        let pending_total = state
            .records()
            .filter(|r| r.status == TaskStatus::Pending)
            .count();
        let exists = state.get(&key).is_some();
        check(AdmissionView {
            owner_active,
            pending_total,
            exists,
        })?;

        let seq = state.next_seq;
        state.next_seq += 1;
        state
            .owners
            .entry(key.owner.clone())
            .or_default()
            .insert(key.task.clone(), TaskRecord::pending(key, params, seq));
        Ok(())
    }

    /// Compare-and-set `from → to`. Returns `false` when the task is missing, not in `from`, or
    /// the move is not a legal lifecycle step.
    pub fn transition(
        &self,
        key: &TaskKey,
        from: TaskStatus,
        to: TaskStatus,
        message: Option<String>,
    ) -> bool {
        if !from.can_transition_to(to) {
            return false;
        }
        let mut state = self.state.lock();
        match state.get_mut(key) {
            Some(rec) if rec.status == from => {
                set_status(rec, to, message);
                true
            }
            _ => false,
        }
    }

    /// Raise progress of a Processing task. Lower values are ignored.
    pub fn set_progress(&self, key: &TaskKey, progress: u8) -> bool {
        let mut state = self.state.lock();
        match state.get_mut(key) {
            Some(rec) if rec.status == TaskStatus::Processing => {
                let progress = progress.min(100);
                if progress > rec.progress {
                    rec.progress = progress;
                    rec.updated_at = Utc::now();
                }
                true
            }
            _ => false,
        }
    }

    /// Run `publish` under the lock if the task is still Processing, then settle it as
    /// Completed (progress 100) or Error.
    pub fn finish_with(
        &self,
        key: &TaskKey,
        publish: impl FnOnce() -> PipelineResult<()>,
    ) -> FinishOutcome {
        let mut state = self.state.lock();
        let Some(rec) = state.get_mut(key) else {
            return FinishOutcome::Skipped(None);
        };
        if rec.status != TaskStatus::Processing {
            return FinishOutcome::Skipped(Some(rec.status));
        }
        match publish() {
            Ok(()) => {
                rec.progress = 100;
                set_status(rec, TaskStatus::Completed, None);
                FinishOutcome::Completed
            }
            Err(e) => {
                let msg = e.to_string();
                set_status(rec, TaskStatus::Error, Some(msg.clone()));
                FinishOutcome::Failed(msg)
            }
        }
    }

    /// Move an active task to Error. Returns the status it left, if any.
    pub fn fail(&self, key: &TaskKey, message: impl Into<String>) -> Option<TaskStatus> {
        let mut state = self.state.lock();
        let rec = state.get_mut(key)?;
        let prev = rec.status;
        if !prev.can_transition_to(TaskStatus::Error) {
            return None;
        }
        set_status(rec, TaskStatus::Error, Some(message.into()));
        Some(prev)
    }

    /// Copy of the record for `key`.
    pub fn get(&self, key: &TaskKey) -> Option<TaskRecord> {
        self.state.lock().get(key).cloned()
    }

    /// Current status of `key`.
    pub fn status(&self, key: &TaskKey) -> Option<TaskStatus> {
        self.state.lock().get(key).map(|r| r.status)
    }

    /// Snapshots of an owner's tasks ordered by creation time, then submission order.
    pub fn snapshot(&self, owner: &OwnerId) -> Vec<TaskSnapshot> {
        let state = self.state.lock();
        let mut recs: Vec<&TaskRecord> = state
            .owners
            .get(owner)
            .map(|tasks| tasks.values().collect())
            .unwrap_or_default();
        recs.sort_by(|a, b| (a.created_at, a.seq).cmp(&(b.created_at, b.seq)));
        recs.into_iter().map(TaskRecord::snapshot).collect()
    }

    /// Whether the owner has any Pending or Processing task.
    pub fn has_active(&self, owner: &OwnerId) -> bool {
        self.state
            .lock()
            .owners
            .get(owner)
            .is_some_and(|tasks| tasks.values().any(|r| r.status.is_active()))
    }

    /// Tasks in `status` across all owners.
    pub fn count_with_status(&self, status: TaskStatus) -> usize {
        self.state
            .lock()
            .records()
            .filter(|r| r.status == status)
            .count()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.state.lock().records().count()
    }

    /// `true` when no task is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove the oldest terminal tasks of `owner` beyond the newest `keep`.
    pub fn evict_excess_terminal(&self, owner: &OwnerId, keep: usize) -> Vec<TaskKey> {
        let mut state = self.state.lock();
        let Some(tasks) = state.owners.get(owner) else {
            return Vec::new();
        };
        let mut terminal: Vec<&TaskRecord> =
            tasks.values().filter(|r| r.status.is_terminal()).collect();
        if terminal.len() <= keep {
            return Vec::new();
        }
        terminal.sort_by(|a, b| (a.created_at, a.seq).cmp(&(b.created_at, b.seq)));
        let excess = terminal.len() - keep;
        let victims: Vec<TaskKey> = terminal[..excess].iter().map(|r| r.key.clone()).collect();
        for key in &victims {
            state.remove(key);
        }
        victims
    }

    /// Remove terminal tasks whose last update is older than `cutoff`.
    pub fn evict_terminal_before(&self, cutoff: DateTime<Utc>) -> Vec<TaskKey> {
        let mut state = self.state.lock();
        let victims: Vec<TaskKey> = state
            .records()
            .filter(|r| r.status.is_terminal() && r.updated_at < cutoff)
            .map(|r| r.key.clone())
            .collect();
        for key in &victims {
            state.remove(key);
        }
        victims
    }

    /// Remove a task only if it is terminal.
    pub fn remove_terminal(&self, key: &TaskKey) -> Option<TaskRecord> {
        let mut state = self.state.lock();
        if state.get(key)?.status.is_terminal() {
            state.remove(key)
        } else {
            None
        }
    }

    /// Run `f` with a predicate telling whether a key is Pending/Processing.
    ///
    /// The lock is held for the duration of `f`, so no task can be admitted meanwhile.
    pub fn with_active<R>(&self, f: impl FnOnce(&dyn Fn(&TaskKey) -> bool) -> R) -> R {
        let state = self.state.lock();
        let is_active = |key: &TaskKey| state.get(key).is_some_and(|r| r.status.is_active());
        f(&is_active)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scheduler/registry.rs"]
mod tests;
