use rayon::prelude::*;

use crate::foundation::error::{PipelineError, PipelineResult};
use crate::foundation::math::{clamp01, u8_to_unit, unit_to_u8};
use crate::render::frame::{Frame, FrameRGBA};

/// Per-pixel rule combining a base channel with an overlay channel, both in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Darkens or lightens by the base channel.
    SoftLight,
    /// `1 - (1 - a)(1 - b)`.
    Screen,
}

impl BlendMode {
    /// Blend one normalized channel.
    #[inline]
    pub fn apply(self, base: f32, ov: f32) -> f32 {
        match self {
            Self::SoftLight => soft_light(base, ov),
            Self::Screen => screen(base, ov),
        }
    }
}

/// Soft-light, branching on the base channel.
#[inline]
pub fn soft_light(base: f32, ov: f32) -> f32 {
    if base <= 0.5 {
        2.0 * base * ov + base * base * (1.0 - 2.0 * ov)
    } else {
        2.0 * base * (1.0 - ov) + base.sqrt() * (2.0 * ov - 1.0)
    }
}

/// Screen: `1 - (1 - base)(1 - ov)`.
#[inline]
pub fn screen(base: f32, ov: f32) -> f32 {
    1.0 - (1.0 - base) * (1.0 - ov)
}

/// One overlay compositing pass.
///
/// `intensity` scales both the overlay colour and its alpha before blending; `boost` scales the
/// blended result before it is composited back over the base.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BlendLayer {
    /// Blend formula.
    pub mode: BlendMode,
    /// Multiplier for overlay colour and alpha.
    pub intensity: f32,
    /// Multiplier for the blended colour.
    pub boost: f32,
}

/// First pass: soft-light.
pub const SOFT_LIGHT_LAYER: BlendLayer = BlendLayer {
    mode: BlendMode::SoftLight,
    intensity: 1.3,
    boost: 1.1,
};

/// Second pass: screen.
pub const SCREEN_LAYER: BlendLayer = BlendLayer {
    mode: BlendMode::Screen,
    intensity: 1.5,
    boost: 1.3,
};

impl BlendLayer {
    /// Blend one straight-alpha overlay pixel into a base pixel.
    pub fn blend_px(&self, base: [u8; 3], ov: [u8; 4]) -> [u8; 3] {
        let alpha = clamp01(u8_to_unit(ov[3]) * self.intensity);
        if alpha <= 0.0 {
            return base;
        }
        let mut out = [0u8; 3];
        for c in 0..3 {
            let b = u8_to_unit(base[c]);
            let o = clamp01(u8_to_unit(ov[c]) * self.intensity);
            let result = u8_to_unit(unit_to_u8(self.mode.apply(b, o) * self.boost));
            out[c] = unit_to_u8(b * (1.0 - alpha) + result * alpha);
        }
        out
    }
}

/// Composite `layer` over `base` in place. Both must share dimensions.
pub fn composite_layer(base: &mut Frame, layer: &FrameRGBA, params: BlendLayer) -> PipelineResult<()> {
    if base.width != layer.width || base.height != layer.height {
        return Err(PipelineError::render(format!(
            "layer size {}x{} does not match frame {}x{}",
            layer.width, layer.height, base.width, base.height
        )));
    }
    let w = base.width as usize;
    base.data
        .par_chunks_mut(w * 3)
        .zip(layer.data.par_chunks(w * 4))
        .for_each(|(row, ov_row)| {
            for (d, s) in row.chunks_exact_mut(3).zip(ov_row.chunks_exact(4)) {
                let out = params.blend_px([d[0], d[1], d[2]], [s[0], s[1], s[2], s[3]]);
                d.copy_from_slice(&out);
            }
        });
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/blend.rs"]
mod tests;
