use crate::foundation::core::Canvas;
use crate::foundation::error::{PipelineError, PipelineResult};

/// A composited output frame as RGB8 pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGB8 bytes, tightly packed, row-major (`height × width × 3`).
    pub data: Vec<u8>,
}

impl Frame {
    /// Allocate a black frame covering `canvas`.
    pub fn black(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0; canvas.pixel_count() * 3],
        }
    }

    /// Wrap existing RGB8 bytes, checking the buffer length.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> PipelineResult<Self> {
        if data.len() != (width as usize) * (height as usize) * 3 {
            return Err(PipelineError::validation(format!(
                "rgb8 buffer has {} bytes, expected {width}x{height}x3",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let off = ((y as usize) * (self.width as usize) + (x as usize)) * 3;
        let px = self.data.get(off..off + 3)?;
        Some([px[0], px[1], px[2]])
    }

    /// Encode as PNG bytes.
    pub fn to_png(&self) -> PipelineResult<Vec<u8>> {
        use anyhow::Context as _;
        let img = image::RgbImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| PipelineError::render("frame buffer does not match its dimensions"))?;
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .context("encode frame as png")?;
        Ok(buf)
    }
}

/// An RGBA8 layer frame with straight (non-premultiplied) alpha.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
}

impl FrameRGBA {
    /// Wrap existing RGBA8 bytes, checking the buffer length.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> PipelineResult<Self> {
        if width == 0 || height == 0 {
            return Err(PipelineError::validation("rgba frame must be non-empty"));
        }
        if data.len() != (width as usize) * (height as usize) * 4 {
            return Err(PipelineError::validation(format!(
                "rgba8 buffer has {} bytes, expected {width}x{height}x4",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Single-colour frame, mostly useful for fixtures.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take((width as usize) * (height as usize) * 4)
            .collect();
        Self {
            width,
            height,
            data,
        }
    }
}
