use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{PipelineError, PipelineResult};
use crate::render::frame::FrameRGBA;

/// Decoded source still, flattened to opaque RGB8.
#[derive(Clone, Debug)]
pub struct SourceImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGB8 bytes, tightly packed, row-major.
    pub rgb8: Arc<Vec<u8>>,
}

/// Decode any raster format the `image` crate can sniff into RGB8.
pub fn decode_image(bytes: &[u8]) -> PipelineResult<SourceImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgb = dyn_img.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(PipelineError::validation("source image has no pixels"));
    }
    Ok(SourceImage {
        width,
        height,
        rgb8: Arc::new(rgb.into_raw()),
    })
}

/// Read and decode a source still from disk.
pub fn decode_image_file(path: &Path) -> PipelineResult<SourceImage> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("read source image '{}'", path.display()))?;
    decode_image(&bytes)
}

/// Decode an image into a straight-alpha RGBA8 layer frame.
pub fn decode_rgba_frame(bytes: &[u8]) -> PipelineResult<FrameRGBA> {
    let dyn_img = image::load_from_memory(bytes).context("decode layer image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    FrameRGBA::from_raw(width, height, rgba.into_raw())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
