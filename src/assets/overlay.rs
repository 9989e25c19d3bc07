use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::assets::decode::decode_rgba_frame;
use crate::assets::media::{decode_video_frames_rgba8, probe_video};
use crate::foundation::core::Fps;
use crate::foundation::error::{PipelineError, PipelineResult};
use crate::render::frame::FrameRGBA;

/// A looping decorative layer: an immutable sequence of equally sized RGBA frames.
#[derive(Clone, Debug)]
pub struct OverlayAsset {
    frames: Arc<Vec<FrameRGBA>>,
    fps: Fps,
}

impl OverlayAsset {
    /// Build from already decoded frames. All frames must share one size.
    pub fn from_frames(frames: Vec<FrameRGBA>, fps: Fps) -> PipelineResult<Self> {
        let Some(first) = frames.first() else {
            return Err(PipelineError::resource("overlay has no frames"));
        };
        let (w, h) = (first.width, first.height);
        if frames.iter().any(|f| f.width != w || f.height != h) {
            return Err(PipelineError::resource(
                "overlay frames must all share the same dimensions",
            ));
        }
        Ok(Self {
            frames: Arc::new(frames),
            fps,
        })
    }

    /// Load a layer from a directory of still frames (sorted by file name) or a video file.
    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path, fps: Fps) -> PipelineResult<Self> {
        let frames = if path.is_dir() {
            load_frame_dir(path)?
        } else if path.is_file() {
            let info = probe_video(path)?;
            tracing::debug!(
                width = info.width,
                height = info.height,
                source_fps = info.source_fps(),
                "decoding overlay video"
            );
            decode_video_frames_rgba8(&info, fps)?
        } else {
            return Err(PipelineError::resource(format!(
                "overlay '{}' does not exist",
                path.display()
            )));
        };
        let asset = Self::from_frames(frames, fps)?;
        tracing::info!(
            frames = asset.frame_count(),
            duration_secs = asset.duration_secs(),
            "overlay loaded"
        );
        Ok(asset)
    }

    /// Number of frames in one loop.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Playback rate of the loop.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Length of one loop in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frames.len() as f64 * self.fps.frame_duration_secs()
    }

    /// Frame visible at time `t`, wrapping modulo the loop length.
    pub fn frame_at(&self, t: f64) -> &FrameRGBA {
        let local = t.max(0.0) % self.duration_secs();
        let idx = ((local * self.fps.as_f64()).floor() as usize).min(self.frames.len() - 1);
        &self.frames[idx]
    }
}

/// The two layers every render is composited with.
#[derive(Clone, Debug)]
pub struct OverlaySet {
    /// Layer blended with soft-light.
    pub soft_light: OverlayAsset,
    /// Layer blended with screen.
    pub screen: OverlayAsset,
}

impl OverlaySet {
    /// Load both layers. Any failure is fatal for the caller.
    pub fn load(soft_light: &Path, screen: &Path, fps: Fps) -> PipelineResult<Self> {
        Ok(Self {
            soft_light: OverlayAsset::load(soft_light, fps)?,
            screen: OverlayAsset::load(screen, fps)?,
        })
    }
}

fn load_frame_dir(dir: &Path) -> PipelineResult<Vec<FrameRGBA>> {
    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("read overlay directory '{}'", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect::<Vec<_>>();
    paths.sort();

    paths
        .iter()
        .map(|p| {
            let bytes =
                std::fs::read(p).with_context(|| format!("read overlay frame '{}'", p.display()))?;
            decode_rgba_frame(&bytes)
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/assets/overlay.rs"]
mod tests;
