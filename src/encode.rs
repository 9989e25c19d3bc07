/// `ffmpeg`-based sink (MP4 output via system `ffmpeg`).
pub mod ffmpeg;
/// Frame sink contract, encoder factory and the in-memory sink.
pub mod sink;
