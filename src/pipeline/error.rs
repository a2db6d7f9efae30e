//! Pipeline error type.

use crate::ascii::RasterizeError;

/// Errors that can occur while converting a video to text frames
#[derive(Debug)]
pub enum PipelineError {
    /// Source file missing, too large, or not a video
    InvalidSource(String),
    /// Conversion options out of range
    InvalidOptions(String),
    /// FFmpeg (or ffprobe) executable not found
    FfmpegNotFound,
    /// FFmpeg ran but did not produce frames
    ExtractionFailed { exit_code: Option<i32>, stderr: String },
    /// A sampled frame could not be rasterized
    Rasterize { index: usize, source: RasterizeError },
    /// Conversion was cancelled at a batch boundary
    Cancelled,
    /// A blocking worker task panicked or was aborted
    Worker(tokio::task::JoinError),
    /// I/O error on the working files
    IoError(std::io::Error),
}

impl PipelineError {
    /// True for errors caused by the caller's input rather than the system.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidSource(_) | PipelineError::InvalidOptions(_)
        )
    }
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::InvalidSource(msg) => write!(f, "Invalid video source: {}", msg),
            PipelineError::InvalidOptions(msg) => write!(f, "Invalid conversion options: {}", msg),
            PipelineError::FfmpegNotFound => {
                write!(
                    f,
                    "FFmpeg not found. Please install ffmpeg and make sure it is on your PATH"
                )
            }
            PipelineError::ExtractionFailed { exit_code, stderr } => {
                write!(f, "FFmpeg exited with code {:?}\n{}", exit_code, stderr)
            }
            PipelineError::Rasterize { index, source } => {
                write!(f, "Failed to rasterize frame {}: {}", index, source)
            }
            PipelineError::Cancelled => write!(f, "Conversion cancelled"),
            PipelineError::Worker(e) => write!(f, "Worker task failed: {}", e),
            PipelineError::IoError(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Rasterize { source, .. } => Some(source),
            PipelineError::Worker(e) => Some(e),
            PipelineError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(e: std::io::Error) -> Self {
        PipelineError::IoError(e)
    }
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(e: tokio::task::JoinError) -> Self {
        PipelineError::Worker(e)
    }
}

/// Map a spawn failure, treating a missing executable as [`PipelineError::FfmpegNotFound`].
pub(crate) fn spawn_error(e: std::io::Error) -> PipelineError {
    if e.kind() == std::io::ErrorKind::NotFound {
        PipelineError::FfmpegNotFound
    } else {
        PipelineError::IoError(e)
    }
}
