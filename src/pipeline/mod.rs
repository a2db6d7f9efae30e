//! Video to ASCII conversion pipeline.
//!
//! A [`Converter`] asks a [`FrameExtractor`] to sample the source video at a
//! bounded frame rate, then rasterizes the sampled frames in batches on
//! blocking worker tasks and collects them, in order, into a
//! [`FrameSequence`](crate::ascii::FrameSequence).

mod converter;
mod error;
mod extractor;
mod source;

pub use converter::{
    effective_frame_rate, ConvertOptions, Converter, PipelineConfig, DEFAULT_BATCH_PAUSE,
    DEFAULT_BATCH_SIZE, DEFAULT_MAX_FRAMES, DEFAULT_MAX_FRAME_RATE,
};
pub use error::PipelineError;
pub use extractor::{parse_frame_rate, ExtractPlan, FfmpegExtractor, FrameExtractor, FrameSource};
pub use source::{validate_source, WorkingVideo, MAX_SOURCE_BYTES, VIDEO_EXTENSIONS};
