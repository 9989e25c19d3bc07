//! Task lifecycle: admission, execution, supervision, status and cleanup.

/// Submission limits and validation.
pub mod admission;
/// The locked task table.
pub mod registry;
/// Count and age based cleanup of finished work.
pub mod retention;
/// The `RenderService` facade.
pub mod service;
/// Snapshot queries and status streams.
pub mod status;
/// Artifact naming, publishing and scanning.
pub mod storage;
/// Task identifiers, lifecycle states and records.
pub mod task;
/// Processing-time ceiling enforcement.
pub mod timeout;
/// The bounded render worker pool.
pub mod worker;
