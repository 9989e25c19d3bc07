/// Overlay blend modes and the two fixed compositing passes.
pub mod blend;
/// Saturation adjustment.
pub mod color;
/// Per-frame compositor and the lazy frame sequence.
pub mod compositor;
/// RGB8 output frames and RGBA8 layer frames.
pub mod frame;
/// Edge-reflecting, anti-aliased region resampling.
pub mod resample;
