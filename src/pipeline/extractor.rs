//! Frame extraction: source video to an ordered run of encoded raster frames.
//!
//! The [`FrameExtractor`] trait is the seam between the converter and the
//! decoding engine. [`FfmpegExtractor`] drives the `ffmpeg`/`ffprobe`
//! executables; tests plug in their own sources.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tempfile::TempDir;

use super::error::{spawn_error, PipelineError};

/// How the extractor should sample the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractPlan {
    /// Sampling rate in frames per second
    pub frame_rate: f64,
    /// Stop after this many frames
    pub max_frames: usize,
    /// Pre-scale frames to this pixel width (height keeps the aspect ratio)
    pub scale_width: Option<u32>,
}

/// Produces encoded frames (PNG/JPEG bytes) in sampling order.
pub trait FrameSource: Send {
    /// Next frame, or `None` once the source has no more frames.
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>, PipelineError>;
}

/// Opens a source video as a [`FrameSource`].
///
/// Both methods block; callers on the async runtime run them via
/// `spawn_blocking`.
pub trait FrameExtractor: Send + Sync {
    fn extract(&self, source: &Path, plan: &ExtractPlan) -> Result<Box<dyn FrameSource>, PipelineError>;

    /// Average frame rate of the source, when it can be determined.
    fn detect_frame_rate(&self, _source: &Path) -> Result<Option<f64>, PipelineError> {
        Ok(None)
    }
}

/// Extractor backed by the ffmpeg and ffprobe executables.
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Default for FfmpegExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegExtractor {
    /// Use `ffmpeg` and `ffprobe` from `PATH`.
    pub fn new() -> Self {
        Self::with_executables("ffmpeg", "ffprobe")
    }

    pub fn with_executables(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }
}

impl FrameExtractor for FfmpegExtractor {
    fn extract(&self, source: &Path, plan: &ExtractPlan) -> Result<Box<dyn FrameSource>, PipelineError> {
        let work_dir = tempfile::Builder::new()
            .prefix("ascii-stream-frames-")
            .tempdir()?;
        let pattern = work_dir.path().join("frame_%d.png");
        let args = extract_args(source, plan, &pattern);

        log::debug!("Running {} {:?}", self.ffmpeg.display(), args);

        let output = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(spawn_error)?;

        if !output.status.success() {
            return Err(PipelineError::ExtractionFailed {
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(Box::new(PngSequence::new(work_dir)))
    }

    fn detect_frame_rate(&self, source: &Path) -> Result<Option<f64>, PipelineError> {
        let output = Command::new(&self.ffprobe)
            .args(["-v", "error", "-select_streams", "v:0"])
            .args(["-show_entries", "stream=avg_frame_rate"])
            .args(["-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(source)
            .stdin(Stdio::null())
            .output()
            .map_err(spawn_error)?;

        if !output.status.success() {
            log::warn!(
                "ffprobe could not read {}: {}",
                source.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Ok(None);
        }

        let rate = String::from_utf8_lossy(&output.stdout)
            .lines()
            .find_map(parse_frame_rate);
        Ok(rate)
    }
}

/// ffmpeg arguments that sample `source` into numbered PNGs at `pattern`.
pub(crate) fn extract_args(source: &Path, plan: &ExtractPlan, pattern: &Path) -> Vec<OsString> {
    let filter = match plan.scale_width {
        Some(width) => format!("fps={},scale={}:-1", plan.frame_rate, width),
        None => format!("fps={}", plan.frame_rate),
    };

    vec![
        "-loglevel".into(),
        "error".into(),
        "-y".into(),
        "-i".into(),
        source.into(),
        "-vf".into(),
        filter.into(),
        "-frames:v".into(),
        plan.max_frames.to_string().into(),
        pattern.into(),
    ]
}

/// Parse an ffprobe rate such as `30000/1001` or `25`.
///
/// Returns `None` for `0/0` and anything that is not a positive finite rate.
pub fn parse_frame_rate(text: &str) -> Option<f64> {
    let text = text.trim();
    let rate = match text.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => text.parse().ok()?,
    };

    (rate.is_finite() && rate > 0.0).then_some(rate)
}

/// Numbered PNG files written by ffmpeg, read back in order.
///
/// The directory is removed when the source is dropped.
struct PngSequence {
    dir: TempDir,
    next_index: usize,
}

impl PngSequence {
    fn new(dir: TempDir) -> Self {
        // ffmpeg numbers %d outputs from 1
        Self { dir, next_index: 1 }
    }
}

impl FrameSource for PngSequence {
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>, PipelineError> {
        let path = self.dir.path().join(format!("frame_{}.png", self.next_index));
        match std::fs::read(&path) {
            Ok(bytes) => {
                self.next_index += 1;
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
