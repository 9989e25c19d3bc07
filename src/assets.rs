/// Still-image decoding.
pub mod decode;
/// `ffprobe`/`ffmpeg` helpers for layer videos.
pub mod media;
/// Looping overlay layers.
pub mod overlay;
