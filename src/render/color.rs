use rayon::prelude::*;

use crate::render::frame::Frame;

/// Lower bound of the saturation control (fully desaturated).
pub const SATURATION_MIN: f32 = -100.0;
/// Upper bound of the saturation control.
pub const SATURATION_MAX: f32 = 100.0;

/// Rec. 601 luma.
#[inline]
pub fn luma(px: [u8; 3]) -> f32 {
    0.2989 * f32::from(px[0]) + 0.5870 * f32::from(px[1]) + 0.1140 * f32::from(px[2])
}

/// Move every channel away from (or towards) its pixel's luma by `(s + 100) / 100`.
///
/// `s = 0` is the identity and `s = -100` leaves pure luma.
pub fn apply_saturation(frame: &mut Frame, saturation: f32) {
    if saturation == 0.0 {
        return;
    }
    let k = (saturation + 100.0) / 100.0;
    let row_len = frame.width as usize * 3;
    frame.data.par_chunks_mut(row_len.max(3)).for_each(|row| {
        for px in row.chunks_exact_mut(3) {
            let l = luma([px[0], px[1], px[2]]);
            for c in px.iter_mut() {
                *c = (l + (f32::from(*c) - l) * k).round().clamp(0.0, 255.0) as u8;
            }
        }
    });
}

#[cfg(test)]
#[path = "../../tests/unit/render/color.rs"]
mod tests;
