use crate::foundation::error::{PipelineError, PipelineResult};

/// Absolute 0-based frame index in render timeline space.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Half-open frame range `[start, end)` in timeline space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRange {
    /// Inclusive range start.
    pub start: FrameIndex,
    /// Exclusive range end.
    pub end: FrameIndex, // exclusive
}

impl FrameRange {
    /// Create a validated range with `start <= end`.
    pub fn new(start: FrameIndex, end: FrameIndex) -> PipelineResult<Self> {
        if start.0 > end.0 {
            return Err(PipelineError::validation("FrameRange start must be <= end"));
        }
        Ok(Self { start, end })
    }

    /// Number of frames contained in the range.
    pub fn len_frames(self) -> u64 {
        self.end.0.saturating_sub(self.start.0)
    }

    /// Return `true` when the range has no frames.
    pub fn is_empty(self) -> bool {
        self.start.0 == self.end.0
    }

    /// Return `true` when `f` is inside `[start, end)`.
    pub fn contains(self, f: FrameIndex) -> bool {
        self.start.0 <= f.0 && f.0 < self.end.0
    }
}

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32, // must be > 0
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> PipelineResult<Self> {
        if den == 0 {
            return Err(PipelineError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(PipelineError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Timeline time of frame `idx` in seconds.
    pub fn frame_time_secs(self, idx: FrameIndex) -> f64 {
        (idx.0 as f64) * f64::from(self.den) / f64::from(self.num)
    }

    /// Convert seconds to frame count using floor semantics.
    pub fn secs_to_frames_floor(self, secs: f64) -> u64 {
        // Nudge by a tiny epsilon so exact products such as 2.0 * 25 do not floor to 49.
        (secs * self.as_f64() + 1e-9).floor().max(0.0) as u64
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Number of pixels covered by the canvas.
    pub fn pixel_count(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

/// Crop window in source-image pixel space.
///
/// Coordinates are fractional while interpolating; [`CropRect::to_pixel_rect`] produces the
/// integer window actually sampled.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CropRect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Window width.
    pub width: f64,
    /// Window height.
    pub height: f64,
}

impl CropRect {
    /// Build a crop window from its components.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Reject non-finite, negative or empty windows.
    pub fn validate(&self) -> PipelineResult<()> {
        let parts = [self.x, self.y, self.width, self.height];
        if parts.iter().any(|v| !v.is_finite()) {
            return Err(PipelineError::validation("crop rect values must be finite"));
        }
        if self.x < 0.0 || self.y < 0.0 {
            return Err(PipelineError::validation("crop rect origin must be >= 0"));
        }
        if self.width < 1.0 || self.height < 1.0 {
            return Err(PipelineError::validation(
                "crop rect width/height must be >= 1",
            ));
        }
        Ok(())
    }

    /// Component-wise linear interpolation towards `other` by `t` in `[0, 1]`.
    pub fn lerp(self, other: CropRect, t: f64) -> CropRect {
        let mix = |a: f64, b: f64| a + (b - a) * t;
        CropRect {
            x: mix(self.x, other.x),
            y: mix(self.y, other.y),
            width: mix(self.width, other.width),
            height: mix(self.height, other.height),
        }
    }

    /// Truncate to the integer window that is sampled from the source.
    pub fn to_pixel_rect(self) -> PixelRect {
        PixelRect {
            x: self.x.max(0.0) as u32,
            y: self.y.max(0.0) as u32,
            width: (self.width.max(1.0) as u32).max(1),
            height: (self.height.max(1.0) as u32).max(1),
        }
    }
}

/// Parses `x,y,width,height`.
impl std::str::FromStr for CropRect {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PipelineError::validation(format!("crop rect '{s}': {e}")))?;
        let [x, y, width, height] = parts[..] else {
            return Err(PipelineError::validation(format!(
                "crop rect '{s}' must have four comma-separated values"
            )));
        };
        Ok(Self::new(x, y, width, height))
    }
}

/// Integer crop window in source-image pixel space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PixelRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width, at least 1.
    pub width: u32,
    /// Height, at least 1.
    pub height: u32,
}

impl PixelRect {
    /// Build an integer window from its components.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
