use std::path::Path;

use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{PipelineError, PipelineResult};
use crate::render::frame::Frame;

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
}

/// Sink contract for consuming rendered frames in timeline order.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> PipelineResult<()>;
    /// Push one frame in strictly increasing timeline order.
    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> PipelineResult<()>;
    /// Called once after the last frame is pushed. The artifact is complete only if this succeeds.
    fn end(&mut self) -> PipelineResult<()>;
}

/// Creates a fresh sink writing to `out_path` for every task.
pub trait EncoderFactory: Send + Sync {
    /// New sink writing to `out_path`.
    fn create(&self, out_path: &Path) -> PipelineResult<Box<dyn FrameSink>>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    /// Frames in timeline order.
    pub(crate) frames: Vec<(FrameIndex, Frame)>,
    ended: bool,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(FrameIndex, Frame)] {
        &self.frames
    }

    /// `true` once `end` has been called.
    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> PipelineResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &Frame) -> PipelineResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> PipelineResult<()> {
        self.ended = true;
        Ok(())
    }
}

/// Drive `frames` through `sink`: `begin`, one `push_frame` per frame, then `end`.
///
/// `after_frame` runs after every pushed frame; an error from it aborts before `end`, so the
/// sink never finalizes a partial artifact.
pub fn encode_frames<I>(
    frames: I,
    cfg: SinkConfig,
    sink: &mut dyn FrameSink,
    mut after_frame: impl FnMut(FrameIndex) -> PipelineResult<()>,
) -> PipelineResult<u64>
where
    I: Iterator<Item = PipelineResult<(FrameIndex, Frame)>>,
{
    sink.begin(cfg)?;
    let mut count = 0u64;
    for item in frames {
        let (idx, frame) = item?;
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(PipelineError::encode(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        sink.push_frame(idx, &frame)?;
        count += 1;
        after_frame(idx)?;
    }
    if count == 0 {
        return Err(PipelineError::encode("no frames to encode"));
    }
    sink.end()?;
    Ok(count)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
