use crate::animation::ease::Ease;
use crate::foundation::core::CropRect;
use crate::foundation::error::{PipelineError, PipelineResult};

/// Ping-pong crop motion: the window travels from `start` to `end` during the first half of
/// the clip and returns during the second half.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CropMotion {
    /// Window at `t = 0` and `t = duration`.
    pub start: CropRect,
    /// Window at `t = duration / 2`.
    pub end: CropRect,
    /// Clip length in seconds.
    pub duration_secs: f64,
    /// Curve applied to the ping-pong phase.
    #[serde(default)]
    pub ease: Ease,
}

impl CropMotion {
    /// Build an ease-in-out motion between two windows.
    pub fn new(start: CropRect, end: CropRect, duration_secs: f64) -> PipelineResult<Self> {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(PipelineError::validation(
                "motion duration must be finite and > 0",
            ));
        }
        start.validate()?;
        end.validate()?;
        Ok(Self {
            start,
            end,
            duration_secs,
            ease: Ease::InOutSine,
        })
    }

    /// Triangular phase in `[0, 1]`: 0 at both ends, 1 at the midpoint.
    pub fn phase(&self, t: f64) -> f64 {
        let half = self.duration_secs / 2.0;
        let t = t.clamp(0.0, self.duration_secs);
        if t <= half { t / half } else { 2.0 - t / half }
    }

    /// Eased interpolation weight at time `t`.
    pub fn eased(&self, t: f64) -> f64 {
        self.ease.apply(self.phase(t))
    }

    /// Interpolated crop window at time `t`.
    pub fn crop_at(&self, t: f64) -> CropRect {
        self.start.lerp(self.end, self.eased(t))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/motion.rs"]
mod tests;
