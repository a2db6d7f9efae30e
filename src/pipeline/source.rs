//! Source validation and temporary working copies of downloaded videos.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::error::PipelineError;

/// Largest accepted source video (100 MiB).
pub const MAX_SOURCE_BYTES: u64 = 100 * 1024 * 1024;

/// File extensions accepted as video input.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "avi", "webm", "m4v", "gif"];

/// Check a local file before any conversion work starts.
///
/// The file must exist, be a regular file, be no larger than
/// [`MAX_SOURCE_BYTES`], and carry one of [`VIDEO_EXTENSIONS`].
pub fn validate_source(path: &Path) -> Result<(), PipelineError> {
    let metadata = fs::metadata(path).map_err(|e| {
        PipelineError::InvalidSource(format!("cannot read {}: {}", path.display(), e))
    })?;

    if !metadata.is_file() {
        return Err(PipelineError::InvalidSource(format!(
            "{} is not a regular file",
            path.display()
        )));
    }

    if metadata.len() > MAX_SOURCE_BYTES {
        return Err(PipelineError::InvalidSource(format!(
            "{} is {} bytes, the limit is {} bytes",
            path.display(),
            metadata.len(),
            MAX_SOURCE_BYTES
        )));
    }

    if !has_video_extension(path) {
        return Err(PipelineError::InvalidSource(format!(
            "{} does not look like a video (expected one of: {})",
            path.display(),
            VIDEO_EXTENSIONS.join(", ")
        )));
    }

    Ok(())
}

fn has_video_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.iter().any(|v| v.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// A temporary on-disk copy of a video fed to the extractor.
///
/// The containing directory is deleted when this value is dropped.
#[derive(Debug)]
pub struct WorkingVideo {
    _dir: TempDir,
    path: PathBuf,
}

impl WorkingVideo {
    /// Reserve an empty working file named `input.<extension>`.
    pub fn new(extension: &str) -> Result<Self, PipelineError> {
        let dir = tempfile::Builder::new()
            .prefix("ascii-stream-video-")
            .tempdir()?;
        let path = dir.path().join(format!("input.{}", extension.trim_start_matches('.')));
        Ok(Self { _dir: dir, path })
    }

    /// Write `bytes` into a fresh working file.
    pub fn from_bytes(bytes: &[u8], extension: &str) -> Result<Self, PipelineError> {
        if bytes.is_empty() {
            return Err(PipelineError::InvalidSource("video data is empty".to_string()));
        }
        if bytes.len() as u64 > MAX_SOURCE_BYTES {
            return Err(PipelineError::InvalidSource(format!(
                "video is {} bytes, the limit is {} bytes",
                bytes.len(),
                MAX_SOURCE_BYTES
            )));
        }

        let video = Self::new(extension)?;
        fs::write(&video.path, bytes)?;
        Ok(video)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
