//! Still-image to short-video rendering pipeline.
//!
//! A [`Compositor`] turns one source image into a fixed-length clip: a crop window eases out to
//! a second window and back, the result is desaturated or saturated, then two looping overlay
//! layers are blended on top (soft-light, then screen). Frames go to a [`FrameSink`], normally
//! the ffmpeg MP4 encoder.
//!
//! [`RenderService`] runs many such renders concurrently for many owners, with admission
//! limits, a fixed worker pool, a processing timeout, polled status streams and retention of
//! finished artifacts.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Crop-window motion and easing.
pub mod animation;
/// Source image, overlay and video decoding.
pub mod assets;
/// Pipeline configuration.
pub mod config;
/// Frame sinks and the ffmpeg MP4 encoder.
pub mod encode;
/// Core types, errors and numeric helpers.
pub mod foundation;
/// Tracing subscriber setup.
pub mod logging;
/// Per-frame compositing.
pub mod render;
/// Task admission, execution and lifecycle.
pub mod scheduler;

pub use animation::ease::Ease;
pub use animation::motion::CropMotion;
pub use assets::decode::{SourceImage, decode_image, decode_image_file};
pub use assets::overlay::{OverlayAsset, OverlaySet};
pub use config::{OverlayConfig, PipelineConfig};
pub use encode::ffmpeg::{EncoderSettings, FfmpegEncoderFactory, FfmpegSink, FfmpegSinkOpts};
pub use encode::sink::{EncoderFactory, FrameSink, InMemorySink, SinkConfig, encode_frames};
pub use foundation::core::{Canvas, CropRect, Fps, FrameIndex, FrameRange, PixelRect};
pub use foundation::error::{PipelineError, PipelineResult};
pub use render::compositor::{Compositor, FrameSequence, RenderParams, render_frame};
pub use render::frame::{Frame, FrameRGBA};
pub use scheduler::admission::{AdmissionError, AdmissionLimits};
pub use scheduler::registry::TaskRegistry;
pub use scheduler::retention::RetentionPolicy;
pub use scheduler::service::{RenderService, SubmitResponse};
pub use scheduler::status::sse_event;
pub use scheduler::storage::{ArtifactKind, ArtifactStore};
pub use scheduler::task::{
    OwnerId, RenderRequest, TaskId, TaskKey, TaskRecord, TaskSnapshot, TaskStatus,
};
