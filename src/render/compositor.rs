use std::sync::Arc;

use crate::animation::motion::CropMotion;
use crate::assets::decode::SourceImage;
use crate::assets::overlay::OverlaySet;
use crate::foundation::core::{Canvas, CropRect, Fps, FrameIndex, FrameRange};
use crate::foundation::error::{PipelineError, PipelineResult};
use crate::render::blend::{SCREEN_LAYER, SOFT_LIGHT_LAYER, composite_layer};
use crate::render::color::{SATURATION_MAX, SATURATION_MIN, apply_saturation};
use crate::render::frame::Frame;
use crate::render::resample::{ImageView, fit_rgba, resample_region};

/// Immutable per-task render parameters.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderParams {
    /// Crop window at the start and end of the clip.
    pub crop_start: CropRect,
    /// Crop window at the clip midpoint.
    pub crop_end: CropRect,
    /// Saturation control in `[-100, 100]`; 0 is neutral.
    pub saturation: f32,
    /// Clip length in seconds.
    pub duration_secs: f64,
    /// Output frame rate.
    pub fps: Fps,
}

impl RenderParams {
    /// Check every field, returning the first problem found.
    pub fn validate(&self) -> PipelineResult<()> {
        self.crop_start.validate()?;
        self.crop_end.validate()?;
        if !self.saturation.is_finite()
            || !(SATURATION_MIN..=SATURATION_MAX).contains(&self.saturation)
        {
            return Err(PipelineError::validation(format!(
                "saturation must be within [{SATURATION_MIN}, {SATURATION_MAX}], got {}",
                self.saturation
            )));
        }
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(PipelineError::validation("duration must be finite and > 0"));
        }
        Fps::new(self.fps.num, self.fps.den)?;
        if self.frame_count() == 0 {
            return Err(PipelineError::validation(
                "duration is shorter than one frame",
            ));
        }
        Ok(())
    }

    /// `floor(duration * fps)`.
    pub fn frame_count(&self) -> u64 {
        self.fps.secs_to_frames_floor(self.duration_secs)
    }

    /// Crop motion described by these parameters.
    pub fn motion(&self) -> PipelineResult<CropMotion> {
        CropMotion::new(self.crop_start, self.crop_end, self.duration_secs)
    }
}

/// Deterministic per-frame renderer for one source still.
///
/// Cloning is cheap: the source pixels and overlays are shared.
#[derive(Clone, Debug)]
pub struct Compositor {
    source: Arc<SourceImage>,
    overlays: Arc<OverlaySet>,
    canvas: Canvas,
    motion: CropMotion,
    params: RenderParams,
}

impl Compositor {
    /// Validate `params` and prepare the motion. The source and overlays are shared, not copied.
    pub fn new(
        source: Arc<SourceImage>,
        overlays: Arc<OverlaySet>,
        canvas: Canvas,
        params: RenderParams,
    ) -> PipelineResult<Self> {
        params.validate()?;
        if canvas.width == 0 || canvas.height == 0 {
            return Err(PipelineError::validation("output canvas must be non-empty"));
        }
        Ok(Self {
            motion: params.motion()?,
            source,
            overlays,
            canvas,
            params,
        })
    }

    /// Output size of every frame.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Parameters this compositor renders with.
    pub fn params(&self) -> &RenderParams {
        &self.params
    }

    /// Render the frame visible at `t` seconds.
    pub fn render_at(&self, t: f64) -> PipelineResult<Frame> {
        let rect = self.motion.crop_at(t).to_pixel_rect();
        let view = ImageView {
            width: self.source.width,
            height: self.source.height,
            channels: 3,
            data: &self.source.rgb8,
        };
        let data = resample_region(view, rect, self.canvas)?;
        let mut frame = Frame::from_raw(self.canvas.width, self.canvas.height, data)?;

        apply_saturation(&mut frame, self.params.saturation);

        let soft = fit_rgba(self.overlays.soft_light.frame_at(t), self.canvas)?;
        composite_layer(&mut frame, &soft, SOFT_LIGHT_LAYER)?;
        let scr = fit_rgba(self.overlays.screen.frame_at(t), self.canvas)?;
        composite_layer(&mut frame, &scr, SCREEN_LAYER)?;

        Ok(frame)
    }

    /// Render output frame `idx`, sampled at `idx / fps`.
    pub fn render_index(&self, idx: FrameIndex) -> PipelineResult<Frame> {
        self.render_at(self.params.fps.frame_time_secs(idx))
    }

    /// Lazy sequence over every output frame.
    pub fn frames(&self) -> FrameSequence {
        FrameSequence::new(self.clone())
    }
}

/// Render a single frame without building a long-lived [`Compositor`].
pub fn render_frame(
    t: f64,
    source: Arc<SourceImage>,
    overlays: Arc<OverlaySet>,
    canvas: Canvas,
    params: RenderParams,
) -> PipelineResult<Frame> {
    Compositor::new(source, overlays, canvas, params)?.render_at(t)
}

/// Finite, restartable iterator over `(FrameIndex, Frame)` in timeline order.
#[derive(Clone, Debug)]
pub struct FrameSequence {
    compositor: Compositor,
    range: FrameRange,
    next: u64,
}

impl FrameSequence {
    fn new(compositor: Compositor) -> Self {
        let range = FrameRange {
            start: FrameIndex(0),
            end: FrameIndex(compositor.params.frame_count()),
        };
        Self {
            compositor,
            range,
            next: 0,
        }
    }

    /// Frame rate the sequence is sampled at.
    pub fn fps(&self) -> Fps {
        self.compositor.params.fps
    }

    /// Output size of every frame.
    pub fn canvas(&self) -> Canvas {
        self.compositor.canvas
    }

    /// Total number of frames, independent of iteration progress.
    pub fn total(&self) -> u64 {
        self.range.len_frames()
    }

    /// Rewind to the first frame.
    pub fn restart(&mut self) {
        self.next = self.range.start.0;
    }
}

impl Iterator for FrameSequence {
    type Item = PipelineResult<(FrameIndex, Frame)>;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = FrameIndex(self.next);
        if !self.range.contains(idx) {
            return None;
        }
        self.next += 1;
        Some(self.compositor.render_index(idx).map(|f| (idx, f)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.range.end.0.saturating_sub(self.next) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for FrameSequence {}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
