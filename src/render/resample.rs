use std::borrow::Cow;

use rayon::prelude::*;

use crate::foundation::core::{Canvas, PixelRect};
use crate::foundation::error::{PipelineError, PipelineResult};
use crate::foundation::math::reflect_index;
use crate::render::frame::FrameRGBA;

/// Borrowed interleaved 8-bit image.
#[derive(Clone, Copy, Debug)]
pub struct ImageView<'a> {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Interleaved channels per pixel, 1 to 4.
    pub channels: usize,
    /// Row-major pixel bytes.
    pub data: &'a [u8],
}

#[derive(Clone, Copy, Debug)]
struct Tap {
    i0: u32,
    i1: u32,
    frac: f32,
}

/// Supersampling taps for one axis: `out_len * n` entries, `n = ceil(span / out_len)`.
fn axis_taps(origin: u32, span: u32, out_len: u32) -> (Vec<Tap>, usize) {
    let scale = f64::from(span) / f64::from(out_len);
    let n = (scale.ceil() as usize).max(1);
    let mut taps = Vec::with_capacity(out_len as usize * n);
    for o in 0..out_len {
        for k in 0..n {
            let pos = (f64::from(o) + (k as f64 + 0.5) / n as f64) * scale - 0.5;
            let base = pos.floor();
            let i = base as i64;
            taps.push(Tap {
                i0: origin + reflect_index(i, span),
                i1: origin + reflect_index(i + 1, span),
                frac: (pos - base) as f32,
            });
        }
    }
    (taps, n)
}

/// Resample `rect` of `src` to `out`, mirroring samples at the window edges.
///
/// The window is first clipped to the image bounds. Downscaling averages `ceil(scale)` bilinear
/// taps per axis.
pub fn resample_region(src: ImageView<'_>, rect: PixelRect, out: Canvas) -> PipelineResult<Vec<u8>> {
    let ch = src.channels;
    if !(1..=4).contains(&ch) {
        return Err(PipelineError::validation("resample supports 1 to 4 channels"));
    }
    if src.data.len() != (src.width as usize) * (src.height as usize) * ch {
        return Err(PipelineError::render("source buffer does not match its dimensions"));
    }
    if out.width == 0 || out.height == 0 {
        return Err(PipelineError::validation("output canvas must be non-empty"));
    }
    let x1 = rect.x.saturating_add(rect.width).min(src.width);
    let y1 = rect.y.saturating_add(rect.height).min(src.height);
    if rect.x >= x1 || rect.y >= y1 {
        return Err(PipelineError::render(format!(
            "crop window {}x{}+{}+{} lies outside the {}x{} source",
            rect.width, rect.height, rect.x, rect.y, src.width, src.height
        )));
    }

    let (xt, nx) = axis_taps(rect.x, x1 - rect.x, out.width);
    let (yt, ny) = axis_taps(rect.y, y1 - rect.y, out.height);
    let norm = 1.0 / (nx * ny) as f32;
    let stride = src.width as usize * ch;
    let row_len = out.width as usize * ch;

    let mut dst = vec![0u8; out.pixel_count() * ch];
    dst.par_chunks_mut(row_len).enumerate().for_each(|(oy, row)| {
        let mut acc = [0f32; 4];
        for ox in 0..out.width as usize {
            acc[..ch].fill(0.0);
            for ty in &yt[oy * ny..(oy + 1) * ny] {
                let r0 = &src.data[ty.i0 as usize * stride..];
                let r1 = &src.data[ty.i1 as usize * stride..];
                for tx in &xt[ox * nx..(ox + 1) * nx] {
                    let c0 = tx.i0 as usize * ch;
                    let c1 = tx.i1 as usize * ch;
                    for c in 0..ch {
                        let top = lerp(f32::from(r0[c0 + c]), f32::from(r0[c1 + c]), tx.frac);
                        let bot = lerp(f32::from(r1[c0 + c]), f32::from(r1[c1 + c]), tx.frac);
                        acc[c] += lerp(top, bot, ty.frac);
                    }
                }
            }
            for c in 0..ch {
                row[ox * ch + c] = (acc[c] * norm).round().clamp(0.0, 255.0) as u8;
            }
        }
    });
    Ok(dst)
}

/// Fit a whole layer frame to `out`, borrowing when it already matches.
pub fn fit_rgba(frame: &FrameRGBA, out: Canvas) -> PipelineResult<Cow<'_, FrameRGBA>> {
    if frame.width == out.width && frame.height == out.height {
        return Ok(Cow::Borrowed(frame));
    }
    let view = ImageView {
        width: frame.width,
        height: frame.height,
        channels: 4,
        data: &frame.data,
    };
    let rect = PixelRect::new(0, 0, frame.width, frame.height);
    let data = resample_region(view, rect, out)?;
    Ok(Cow::Owned(FrameRGBA::from_raw(out.width, out.height, data)?))
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
#[path = "../../tests/unit/render/resample.rs"]
mod tests;
