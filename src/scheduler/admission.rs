use std::sync::Arc;

use crate::render::compositor::RenderParams;
use crate::scheduler::registry::{AdmissionView, TaskRegistry};
use crate::scheduler::storage::ArtifactStore;
use crate::scheduler::task::TaskKey;

/// Caller-visible reasons a submission is refused.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    /// Crop windows or saturation failed validation.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// No source image deposited for the task.
    #[error("source image not found; upload an image first")]
    MissingSource,

    /// The owner already has `limit` Pending or Processing tasks.
    #[error("too many active tasks for this owner (limit {limit})")]
    TooManyActiveTasks {
        /// Per-owner ceiling.
        limit: usize,
    },

    /// `limit` tasks are already Pending across all owners.
    #[error("server busy, try again later (queue limit {limit})")]
    ServerBusy {
        /// Global queue ceiling.
        limit: usize,
    },
}

/// Resource ceilings enforced at submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdmissionLimits {
    /// Pending + Processing tasks allowed per owner.
    pub max_active_per_owner: usize,
    /// Pending tasks allowed across all owners.
    pub max_queue_size: usize,
}

impl AdmissionLimits {
    fn check(&self, view: AdmissionView) -> Result<(), AdmissionError> {
        if view.owner_active >= self.max_active_per_owner {
            return Err(AdmissionError::TooManyActiveTasks {
                limit: self.max_active_per_owner,
            });
        }
        if view.pending_total >= self.max_queue_size {
            return Err(AdmissionError::ServerBusy {
                limit: self.max_queue_size,
            });
        }
        if view.exists {
            return Err(AdmissionError::InvalidParameters(
                "task already exists".to_string(),
            ));
        }
        Ok(())
    }
}

/// Gatekeeper in front of the registry.
#[derive(Clone, Debug)]
pub struct AdmissionController {
    registry: Arc<TaskRegistry>,
    store: Arc<ArtifactStore>,
    limits: AdmissionLimits,
}

impl AdmissionController {
    /// Controller over `registry` and `store` enforcing `limits`.
    pub fn new(
        registry: Arc<TaskRegistry>,
        store: Arc<ArtifactStore>,
        limits: AdmissionLimits,
    ) -> Self {
        Self {
            registry,
            store,
            limits,
        }
    }

    /// Configured ceilings.
    pub fn limits(&self) -> AdmissionLimits {
        self.limits
    }

    /// Validate, then check the source and the counts and insert, all under the registry lock.
    ///
    /// The age sweep deletes files under the same lock, so an admitted task always has its
    /// source. A rejection leaves no trace in the registry.
    pub fn admit(&self, key: &TaskKey, params: RenderParams) -> Result<(), AdmissionError> {
        params
            .validate()
            .map_err(|e| AdmissionError::InvalidParameters(e.to_string()))?;
        let limits = self.limits;
        self.registry.admit_with(key.clone(), params, |view| {
            if !self.store.has_source(key) {
                return Err(AdmissionError::MissingSource);
            }
            limits.check(view)
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scheduler/admission.rs"]
mod tests;
