use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;

use crate::encode::ffmpeg::EncoderSettings;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{PipelineError, PipelineResult};
use crate::render::color::{SATURATION_MAX, SATURATION_MIN};
use crate::scheduler::admission::AdmissionLimits;
use crate::scheduler::retention::{DEFAULT_SWEEP_INTERVAL_SECS, RetentionPolicy};

/// Where the two decorative layers are loaded from.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Soft-light layer: a video file or a directory of still frames.
    pub soft_light: PathBuf,
    /// Screen layer: a video file or a directory of still frames.
    pub screen: PathBuf,
    /// Playback rate of both loops.
    pub fps: u32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            soft_light: PathBuf::from("static/overlays/soft_light.mp4"),
            screen: PathBuf::from("static/overlays/screen.mp4"),
            fps: 25,
        }
    }
}

/// Runtime configuration for the whole pipeline.
///
/// Every field has a default; a JSON file only needs the keys it overrides.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory holding sources, artifacts and markers.
    pub storage_dir: PathBuf,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Clip length in seconds.
    pub duration_secs: f64,
    /// Output frame rate.
    pub fps: u32,
    /// Renders allowed to run at once.
    pub workers: usize,
    /// Pending + Processing tasks allowed per owner.
    pub max_active_per_owner: usize,
    /// Pending tasks allowed across all owners.
    pub max_queue_size: usize,
    /// Ceiling on time spent Processing.
    pub processing_timeout_secs: u64,
    /// Age after which finished records and stray files are deleted.
    pub max_artifact_age_secs: u64,
    /// Finished tasks kept per owner.
    pub retained_per_owner: usize,
    /// Period of status stream snapshots.
    pub status_poll_interval_ms: u64,
    /// Period of the age sweep.
    pub sweep_interval_secs: u64,
    /// Saturation used when a request carries none.
    pub default_saturation: f32,
    /// ffmpeg codec settings.
    pub encoder: EncoderSettings,
    /// Overlay layer sources.
    pub overlays: OverlayConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("static/uploads"),
            width: 768,
            height: 1024,
            duration_secs: 2.0,
            fps: 25,
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            max_active_per_owner: 8,
            max_queue_size: 10,
            processing_timeout_secs: 300,
            max_artifact_age_secs: 3600,
            retained_per_owner: 5,
            status_poll_interval_ms: 500,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            default_saturation: -20.0,
            encoder: EncoderSettings::default(),
            overlays: OverlayConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file and validate.
    pub fn from_path(path: &Path) -> PipelineResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&text)
            .with_context(|| format!("parse config '{}'", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject zero limits, out-of-range values and clips shorter than one frame.
    pub fn validate(&self) -> PipelineResult<()> {
        let positive = [
            ("width", self.width as u64),
            ("height", self.height as u64),
            ("fps", self.fps as u64),
            ("workers", self.workers as u64),
            ("max_active_per_owner", self.max_active_per_owner as u64),
            ("max_queue_size", self.max_queue_size as u64),
            ("processing_timeout_secs", self.processing_timeout_secs),
            ("max_artifact_age_secs", self.max_artifact_age_secs),
            ("status_poll_interval_ms", self.status_poll_interval_ms),
            ("sweep_interval_secs", self.sweep_interval_secs),
            ("overlays.fps", self.overlays.fps as u64),
            ("encoder.threads", self.encoder.threads as u64),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(PipelineError::validation(format!("{name} must be > 0")));
        }
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(PipelineError::validation(
                "duration_secs must be finite and > 0",
            ));
        }
        if self.frame_count() == 0 {
            return Err(PipelineError::validation(
                "duration_secs is shorter than one frame",
            ));
        }
        if !(SATURATION_MIN..=SATURATION_MAX).contains(&self.default_saturation) {
            return Err(PipelineError::validation(format!(
                "default_saturation must be within [{SATURATION_MIN}, {SATURATION_MAX}]"
            )));
        }
        if self.encoder.codec.trim().is_empty() || self.encoder.preset.trim().is_empty() {
            return Err(PipelineError::validation(
                "encoder codec and preset must be non-empty",
            ));
        }
        Ok(())
    }

    /// Output size.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Output frame rate as a validated [`Fps`].
    pub fn output_fps(&self) -> PipelineResult<Fps> {
        Fps::new(self.fps, 1)
    }

    /// Overlay playback rate as a validated [`Fps`].
    pub fn overlay_fps(&self) -> PipelineResult<Fps> {
        Fps::new(self.overlays.fps, 1)
    }

    fn frame_count(&self) -> u64 {
        self.output_fps()
            .map(|fps| fps.secs_to_frames_floor(self.duration_secs))
            .unwrap_or(0)
    }

    /// Submission ceilings.
    pub fn admission_limits(&self) -> AdmissionLimits {
        AdmissionLimits {
            max_active_per_owner: self.max_active_per_owner,
            max_queue_size: self.max_queue_size,
        }
    }

    /// Cleanup settings.
    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy {
            retained_per_owner: self.retained_per_owner,
            max_age: Duration::from_secs(self.max_artifact_age_secs),
            sweep_interval: Duration::from_secs(self.sweep_interval_secs),
        }
    }

    /// Processing ceiling as a [`Duration`].
    pub fn processing_timeout(&self) -> Duration {
        Duration::from_secs(self.processing_timeout_secs)
    }

    /// Status poll period as a [`Duration`].
    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_millis(self.status_poll_interval_ms)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
