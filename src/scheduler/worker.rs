//! Fixed-size pool that drives admitted tasks through the compositor and encoder.

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::assets::decode::decode_image_file;
use crate::assets::overlay::OverlaySet;
use crate::encode::sink::{EncoderFactory, SinkConfig, encode_frames};
use crate::foundation::core::Canvas;
use crate::foundation::error::{PipelineError, PipelineResult};
use crate::render::compositor::Compositor;
use crate::scheduler::registry::{FinishOutcome, TaskRegistry};
use crate::scheduler::retention::RetentionSweeper;
use crate::scheduler::storage::ArtifactStore;
use crate::scheduler::task::{TaskKey, TaskStatus};
use crate::scheduler::timeout::TimeoutSupervisor;

/// Everything a worker needs to run one task.
pub struct WorkerContext {
    /// Shared task table.
    pub registry: Arc<TaskRegistry>,
    /// Storage for sources and artifacts.
    pub store: Arc<ArtifactStore>,
    /// Layers composited into every frame.
    pub overlays: Arc<OverlaySet>,
    /// Builds one sink per task.
    pub encoder: Arc<dyn EncoderFactory>,
    /// Arms the processing ceiling.
    pub timeout: TimeoutSupervisor,
    /// Runs the count rule after each task.
    pub retention: RetentionSweeper,
    /// Output size.
    pub canvas: Canvas,
}

/// Handle for scheduling admitted tasks.
#[derive(Clone, Debug)]
pub struct WorkerPool {
    tx: mpsc::UnboundedSender<TaskKey>,
    workers: usize,
}

impl WorkerPool {
    /// Spawn the dispatcher. At most `workers` tasks are ever Processing.
    pub fn start(
        ctx: Arc<WorkerContext>,
        workers: usize,
        shutdown: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let workers = workers.max(1);
        let (tx, rx) = mpsc::unbounded_channel();
        let slots = Arc::new(Semaphore::new(workers));
        let dispatcher = tokio::spawn(dispatch(ctx, rx, slots, shutdown));
        (Self { tx, workers }, dispatcher)
    }

    /// Queue an admitted task.
    pub fn schedule(&self, key: TaskKey) -> PipelineResult<()> {
        self.tx
            .send(key)
            .map_err(|_| PipelineError::resource("worker pool is shut down"))
    }

    /// Pool size.
    pub fn workers(&self) -> usize {
        self.workers
    }
}

async fn dispatch(
    ctx: Arc<WorkerContext>,
    mut rx: mpsc::UnboundedReceiver<TaskKey>,
    slots: Arc<Semaphore>,
    shutdown: CancellationToken,
) {
    loop {
        let key = tokio::select! {
            _ = shutdown.cancelled() => break,
            next = rx.recv() => match next {
                Some(key) => key,
                None => break,
            },
        };
        let permit = tokio::select! {
            _ = shutdown.cancelled() => break,
            permit = slots.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };
        let ctx = ctx.clone();
        tokio::spawn(async move {
            run_task(ctx, key).await;
            drop(permit);
        });
    }
    debug!("worker dispatcher stopped");
}

#[tracing::instrument(skip(ctx), fields(owner = %key.owner, task = %key.task))]
async fn run_task(ctx: Arc<WorkerContext>, key: TaskKey) {
    if !ctx
        .registry
        .transition(&key, TaskStatus::Pending, TaskStatus::Processing, None)
    {
        debug!("task no longer pending, skipping");
        return;
    }
    info!("processing started");

    let cancel = CancellationToken::new();
    let guard = ctx.timeout.arm(key.clone(), cancel.clone());

    let job_ctx = ctx.clone();
    let job_key = key.clone();
    let job_cancel = cancel.clone();
    let joined =
        tokio::task::spawn_blocking(move || render_job(&job_ctx, &job_key, &job_cancel)).await;
    drop(guard);

    let result = match joined {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(PipelineError::render(format!(
            "render panicked: {}",
            panic_message(e.into_panic())
        ))),
        Err(e) => Err(PipelineError::render(format!("render job aborted: {e}"))),
    };

    match result {
        Ok(()) => {
            let outcome = ctx
                .registry
                .finish_with(&key, || ctx.store.publish(&key).map(|_| ()));
            match outcome {
                FinishOutcome::Completed => info!("task completed"),
                FinishOutcome::Failed(msg) => {
                    ctx.store.discard_partial(&key);
                    warn!(error = %msg, "publishing artifact failed");
                }
                FinishOutcome::Skipped(status) => {
                    ctx.store.discard_partial(&key);
                    info!(status = ?status, "render finished after task left processing; output discarded");
                }
            }
        }
        Err(e) if e.is_cancelled() => {
            ctx.store.discard_partial(&key);
            info!("render abandoned after cancellation");
        }
        Err(e) => {
            ctx.store.discard_partial(&key);
            ctx.registry.fail(&key, e.to_string());
            warn!(error = %e, "render failed");
        }
    }

    ctx.retention.sweep_owner(&key.owner);
}

fn render_job(
    ctx: &WorkerContext,
    key: &TaskKey,
    cancel: &CancellationToken,
) -> PipelineResult<()> {
    let params = ctx
        .registry
        .get(key)
        .ok_or_else(|| PipelineError::render("task disappeared from registry"))?
        .params;
    let source = Arc::new(decode_image_file(&ctx.store.source_path(key))?);
    let compositor = Compositor::new(source, ctx.overlays.clone(), ctx.canvas, params)?;
    check_cancel(cancel)?;

    let mut sink = ctx.encoder.create(&ctx.store.partial_path(key))?;
    let cfg = SinkConfig {
        width: ctx.canvas.width,
        height: ctx.canvas.height,
        fps: params.fps,
    };
    let frames = encode_frames(compositor.frames(), cfg, sink.as_mut(), |idx| {
        let t = params.fps.frame_time_secs(idx);
        let pct = (100.0 * t / params.duration_secs).floor().clamp(0.0, 100.0) as u8;
        ctx.registry.set_progress(key, pct);
        check_cancel(cancel)
    })?;
    debug!(frames, "encoder finished");
    Ok(())
}

fn check_cancel(cancel: &CancellationToken) -> PipelineResult<()> {
    if cancel.is_cancelled() {
        Err(PipelineError::cancelled("task exceeded its processing time"))
    } else {
        Ok(())
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scheduler/worker.rs"]
mod tests;
