//! Facade that wires admission, workers, status and retention into one handle.

use std::path::PathBuf;
use std::sync::Arc;

use futures::stream::BoxStream;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::assets::overlay::OverlaySet;
use crate::config::PipelineConfig;
use crate::encode::ffmpeg::{FfmpegEncoderFactory, is_ffmpeg_on_path};
use crate::encode::sink::EncoderFactory;
use crate::foundation::core::Fps;
use crate::foundation::error::{PipelineError, PipelineResult};
use crate::render::compositor::RenderParams;
use crate::scheduler::admission::{AdmissionController, AdmissionError};
use crate::scheduler::registry::TaskRegistry;
use crate::scheduler::retention::RetentionSweeper;
use crate::scheduler::status::StatusPublisher;
use crate::scheduler::storage::ArtifactStore;
use crate::scheduler::task::{OwnerId, RenderRequest, TaskId, TaskKey, TaskSnapshot};
use crate::scheduler::timeout::TimeoutSupervisor;
use crate::scheduler::worker::{WorkerContext, WorkerPool};

/// Reply handed back to a submitting frontend.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SubmitResponse {
    /// Whether the task was queued.
    pub accepted: bool,
    /// Confirmation or rejection reason.
    pub message: String,
}

#[derive(Clone, Copy, Debug)]
struct RequestDefaults {
    saturation: f32,
    duration_secs: f64,
    fps: Fps,
}

/// Running pipeline. Dropping it stops the background loops.
pub struct RenderService {
    registry: Arc<TaskRegistry>,
    store: Arc<ArtifactStore>,
    admission: AdmissionController,
    pool: WorkerPool,
    status: StatusPublisher,
    retention: RetentionSweeper,
    defaults: RequestDefaults,
    shutdown: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl RenderService {
    /// Load overlays named in `config` and start with the ffmpeg encoder.
    ///
    /// Overlay load failures are fatal.
    pub fn from_config(config: &PipelineConfig) -> PipelineResult<Self> {
        config.validate()?;
        if !is_ffmpeg_on_path() {
            warn!("ffmpeg not found on PATH; renders will fail until it is installed");
        }
        let overlays = OverlaySet::load(
            &config.overlays.soft_light,
            &config.overlays.screen,
            config.overlay_fps()?,
        )?;
        let encoder = Arc::new(FfmpegEncoderFactory::new(config.encoder.clone()));
        Self::start(config, overlays, encoder)
    }

    /// Open storage and spawn the dispatcher and retention loop on the current runtime.
    pub fn start(
        config: &PipelineConfig,
        overlays: OverlaySet,
        encoder: Arc<dyn EncoderFactory>,
    ) -> PipelineResult<Self> {
        config.validate()?;
        tokio::runtime::Handle::try_current()
            .map_err(|_| PipelineError::resource("RenderService must start inside a tokio runtime"))?;

        let registry = Arc::new(TaskRegistry::new());
        let store = Arc::new(ArtifactStore::open(&config.storage_dir)?);
        let retention =
            RetentionSweeper::new(registry.clone(), store.clone(), config.retention_policy());
        let ctx = Arc::new(WorkerContext {
            registry: registry.clone(),
            store: store.clone(),
            overlays: Arc::new(overlays),
            encoder,
            timeout: TimeoutSupervisor::new(registry.clone(), config.processing_timeout()),
            retention: retention.clone(),
            canvas: config.canvas(),
        });

        let shutdown = CancellationToken::new();
        let (pool, dispatcher) = WorkerPool::start(ctx, config.workers, shutdown.clone());
        let sweeper = tokio::spawn(retention.clone().run(shutdown.clone()));

        info!(
            workers = pool.workers(),
            storage = %store.root().display(),
            "render service started"
        );

        Ok(Self {
            admission: AdmissionController::new(
                registry.clone(),
                store.clone(),
                config.admission_limits(),
            ),
            status: StatusPublisher::new(registry.clone(), config.status_poll_interval()),
            registry,
            store,
            pool,
            retention,
            defaults: RequestDefaults {
                saturation: config.default_saturation,
                duration_secs: config.duration_secs,
                fps: config.output_fps()?,
            },
            shutdown,
            handles: vec![dispatcher, sweeper],
        })
    }

    /// Admit and queue a request, returning its key.
    #[tracing::instrument(skip(self, req), fields(owner = %req.owner_id, task = %req.task_id))]
    pub fn try_submit(&self, req: RenderRequest) -> Result<TaskKey, AdmissionError> {
        let key = TaskKey::new(req.owner_id, req.task_id);
        let params = RenderParams {
            crop_start: req.crop_start,
            crop_end: req.crop_end,
            saturation: req.saturation.unwrap_or(self.defaults.saturation),
            duration_secs: self.defaults.duration_secs,
            fps: self.defaults.fps,
        };

        if let Err(e) = self.admission.admit(&key, params) {
            info!(reason = %e, "submission rejected");
            return Err(e);
        }
        if let Err(e) = self.pool.schedule(key.clone()) {
            warn!(error = %e, "could not queue admitted task");
            self.registry.fail(&key, e.to_string());
            self.registry.remove_terminal(&key);
            return Err(AdmissionError::ServerBusy {
                limit: self.admission.limits().max_queue_size,
            });
        }
        info!("task queued");
        Ok(key)
    }

    /// [`RenderService::try_submit`] flattened into a frontend reply.
    pub fn submit(&self, req: RenderRequest) -> SubmitResponse {
        match self.try_submit(req) {
            Ok(key) => SubmitResponse {
                accepted: true,
                message: format!("task {} accepted", key.task),
            },
            Err(e) => SubmitResponse {
                accepted: false,
                message: e.to_string(),
            },
        }
    }

    /// Store an uploaded source image under a fresh task id.
    pub fn deposit_source(&self, owner: &OwnerId, bytes: &[u8]) -> PipelineResult<TaskId> {
        self.store.deposit_source(owner, bytes)
    }

    /// Current tasks of `owner`, oldest first.
    pub fn list_tasks(&self, owner: &OwnerId) -> Vec<TaskSnapshot> {
        self.status.list_tasks(owner)
    }

    /// Snapshot stream that ends once the owner has no active task.
    pub fn watch(&self, owner: OwnerId) -> BoxStream<'static, Vec<TaskSnapshot>> {
        self.status.watch(owner)
    }

    /// Drop a terminal task and its files once the artifact was delivered.
    pub fn release(&self, key: &TaskKey) -> bool {
        self.retention.release(key)
    }

    /// Marker present and artifact non-empty.
    pub fn is_ready(&self, key: &TaskKey) -> bool {
        self.store.is_ready(key)
    }

    /// Final artifact location, whether or not it exists yet.
    pub fn artifact_path(&self, key: &TaskKey) -> PathBuf {
        self.store.video_path(key)
    }

    /// Shared task table.
    pub fn registry(&self) -> &Arc<TaskRegistry> {
        &self.registry
    }

    /// Shared storage area.
    pub fn store(&self) -> &Arc<ArtifactStore> {
        &self.store
    }

    /// Size of the worker pool.
    pub fn workers(&self) -> usize {
        self.pool.workers()
    }

    /// Stop accepting work and wait for the background loops.
    ///
    /// Tasks already running finish on their own; queued ones stay Pending.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        for handle in std::mem::take(&mut self.handles) {
            if let Err(e) = handle.await {
                warn!(error = %e, "background loop ended abnormally");
            }
        }
        info!("render service stopped");
    }
}

impl Drop for RenderService {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scheduler/service.rs"]
mod tests;
