use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::foundation::core::CropRect;
use crate::foundation::error::{PipelineError, PipelineResult};
use crate::render::compositor::RenderParams;

const MAX_ID_LEN: usize = 64;

fn validate_id(kind: &str, raw: &str) -> PipelineResult<()> {
    if raw.is_empty() {
        return Err(PipelineError::validation(format!("{kind} must be non-empty")));
    }
    if raw.len() > MAX_ID_LEN {
        return Err(PipelineError::validation(format!(
            "{kind} must be at most {MAX_ID_LEN} characters"
        )));
    }
    if !raw.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
        return Err(PipelineError::validation(format!(
            "{kind} may only contain ASCII letters, digits and '-'"
        )));
    }
    Ok(())
}

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap `raw`.
            pub fn new(raw: impl Into<String>) -> PipelineResult<Self> {
                let raw = raw.into();
                validate_id($kind, &raw)?;
                Ok(Self(raw))
            }

            /// Borrow the raw id.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = PipelineError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = PipelineError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

id_type!(
    /// Opaque partition key for one requester (chat or session).
    OwnerId,
    "owner id"
);

id_type!(
    /// Identifier of one render request, unique within its owner.
    TaskId,
    "task id"
);

impl TaskId {
    /// Fresh random id (hyphenated lowercase UUIDv4).
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// Globally unique `(owner, task)` pair.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct TaskKey {
    /// Owning requester.
    pub owner: OwnerId,
    /// Task within the owner.
    pub task: TaskId,
}

impl TaskKey {
    /// Pair `owner` and `task`.
    pub fn new(owner: OwnerId, task: TaskId) -> Self {
        Self { owner, task }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.task)
    }
}

/// Lifecycle state of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Admitted, waiting for a worker.
    Pending,
    /// Being rendered.
    Processing,
    /// Artifact and marker published.
    Completed,
    /// Render or encode failed.
    Error,
    /// Exceeded the processing ceiling.
    Timeout,
}

impl TaskStatus {
    /// Pending or Processing.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Processing)
    }

    /// Completed, Error or Timeout. Terminal states are never left.
    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Pending, Self::Error)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Error)
                | (Self::Processing, Self::Timeout)
        )
    }

    /// Wire name, e.g. `PROCESSING`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Error => "ERROR",
            Self::Timeout => "TIMEOUT",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authoritative registry entry for one task.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskRecord {
    /// Owner and task id.
    pub key: TaskKey,
    /// Lifecycle state.
    pub status: TaskStatus,
    /// Percent complete, `0..=100`.
    pub progress: u8,
    /// Admission time.
    pub created_at: DateTime<Utc>,
    /// Submission order, breaks `created_at` ties.
    pub seq: u64,
    /// Last status or progress change.
    pub updated_at: DateTime<Utc>,
    /// Failure reason for Error and Timeout.
    pub message: Option<String>,
    /// Parameters fixed at admission.
    pub params: RenderParams,
}

impl TaskRecord {
    pub(crate) fn pending(key: TaskKey, params: RenderParams, seq: u64) -> Self {
        let now = Utc::now();
        Self {
            key,
            status: TaskStatus::Pending,
            progress: 0,
            created_at: now,
            seq,
            updated_at: now,
            message: None,
            params,
        }
    }

    /// Status-facing copy.
    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            task_id: self.key.task.clone(),
            status: self.status,
            progress: self.progress,
            created_at: self.created_at,
            message: self.message.clone(),
        }
    }
}

/// Read-only copy of a task as exposed to status consumers.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TaskSnapshot {
    /// Task id.
    pub task_id: TaskId,
    /// Lifecycle state.
    pub status: TaskStatus,
    /// Percent complete.
    pub progress: u8,
    /// Admission time.
    pub created_at: DateTime<Utc>,
    /// Failure reason for Error and Timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A submission as received from a frontend. Duration and frame rate come from configuration.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderRequest {
    /// Submitting owner.
    pub owner_id: OwnerId,
    /// Task id, matching a deposited source.
    pub task_id: TaskId,
    /// Crop window at start and end.
    pub crop_start: CropRect,
    /// Crop window at the midpoint.
    pub crop_end: CropRect,
    /// Saturation in `[-100, 100]`; configured default when absent.
    #[serde(default)]
    pub saturation: Option<f32>,
}

#[cfg(test)]
#[path = "../../tests/unit/scheduler/task.rs"]
mod tests;
