//! Batch conversion of a source video into a [`FrameSequence`].

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::ascii::{rasterize_encoded, DetailLevel, FrameSequence, TextFrame};

use super::error::PipelineError;
use super::extractor::{ExtractPlan, FrameExtractor, FrameSource};

/// Default upper bound on the sampling rate.
pub const DEFAULT_MAX_FRAME_RATE: f64 = 15.0;
/// Default cap on frames per conversion.
pub const DEFAULT_MAX_FRAMES: usize = 1000;
/// Default number of frames rasterized concurrently.
pub const DEFAULT_BATCH_SIZE: usize = 10;
/// Default pause between batches.
pub const DEFAULT_BATCH_PAUSE: Duration = Duration::from_millis(10);

/// Limits applied to every conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub max_frame_rate: f64,
    pub max_frames: usize,
    pub batch_size: usize,
    pub batch_pause: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_frame_rate: DEFAULT_MAX_FRAME_RATE,
            max_frames: DEFAULT_MAX_FRAMES,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_pause: DEFAULT_BATCH_PAUSE,
        }
    }
}

/// Per-conversion options.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    /// Output width in columns
    pub target_width: u32,
    /// Frame rate detected for the source
    pub frame_rate: f64,
    pub detail: DetailLevel,
    /// Overrides [`PipelineConfig::max_frames`] when set
    pub max_frames: Option<usize>,
    pub title: String,
}

/// Sampling rate actually used: `detected` capped at `max`.
///
/// A detected rate that is not a positive finite number falls back to `max`.
pub fn effective_frame_rate(detected: f64, max: f64) -> f64 {
    if detected.is_finite() && detected > 0.0 {
        detected.min(max)
    } else {
        max
    }
}

/// Drives a [`FrameExtractor`] and rasterizes its frames in batches.
pub struct Converter {
    extractor: Arc<dyn FrameExtractor>,
    config: PipelineConfig,
}

impl Converter {
    pub fn new(extractor: Arc<dyn FrameExtractor>, config: PipelineConfig) -> Self {
        Self { extractor, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Convert `source` to text frames.
    ///
    /// `on_progress` is called after every batch with the number of frames
    /// completed so far.
    pub async fn convert<F>(
        &self,
        source: &Path,
        options: &ConvertOptions,
        on_progress: F,
    ) -> Result<FrameSequence, PipelineError>
    where
        F: FnMut(usize) + Send,
    {
        self.convert_with_cancel(source, options, &CancellationToken::new(), on_progress)
            .await
    }

    /// Like [`Converter::convert`], stopping with [`PipelineError::Cancelled`]
    /// at the next batch boundary once `cancel_token` fires.
    pub async fn convert_with_cancel<F>(
        &self,
        source: &Path,
        options: &ConvertOptions,
        cancel_token: &CancellationToken,
        mut on_progress: F,
    ) -> Result<FrameSequence, PipelineError>
    where
        F: FnMut(usize) + Send,
    {
        if options.target_width == 0 {
            return Err(PipelineError::InvalidOptions(
                "target width must be at least 1 column".to_string(),
            ));
        }
        let max_frames = options.max_frames.unwrap_or(self.config.max_frames);
        if max_frames == 0 {
            return Err(PipelineError::InvalidOptions(
                "max frames must be at least 1".to_string(),
            ));
        }
        let max_rate = self.config.max_frame_rate;
        if !(max_rate.is_finite() && max_rate > 0.0) {
            return Err(PipelineError::InvalidOptions(format!(
                "max frame rate must be a positive number, got {}",
                max_rate
            )));
        }
        if cancel_token.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let batch_size = self.config.batch_size.max(1);
        let frame_rate = effective_frame_rate(options.frame_rate, max_rate);
        let width = options.target_width;
        let detail = options.detail;

        log::info!(
            "Converting {} at {} fps (source {} fps), {} columns, {} detail, up to {} frames",
            source.display(),
            frame_rate,
            options.frame_rate,
            width,
            detail,
            max_frames
        );

        let plan = ExtractPlan {
            frame_rate,
            max_frames,
            scale_width: Some(width),
        };
        let extractor = Arc::clone(&self.extractor);
        let source_path = source.to_path_buf();
        let extracted =
            tokio::task::spawn_blocking(move || extractor.extract(&source_path, &plan)).await?;
        let mut frame_source = match extracted {
            Ok(frame_source) => frame_source,
            // Ctrl+C also reaches ffmpeg, which then exits with an error
            Err(e) if cancel_token.is_cancelled() => {
                log::debug!("Extraction stopped by cancellation: {}", e);
                return Err(PipelineError::Cancelled);
            }
            Err(e) => return Err(e),
        };

        let mut frames: Vec<TextFrame> = Vec::new();

        loop {
            if cancel_token.is_cancelled() {
                log::info!("Conversion cancelled after {} frames", frames.len());
                return Err(PipelineError::Cancelled);
            }

            let wanted = batch_size.min(max_frames - frames.len());
            let (returned, batch) = tokio::task::spawn_blocking(move || {
                let batch = read_batch(frame_source.as_mut(), wanted);
                (frame_source, batch)
            })
            .await?;
            frame_source = returned;
            let batch = batch?;

            if batch.is_empty() {
                break;
            }
            let exhausted = batch.len() < wanted;

            let base = frames.len();
            let tasks = batch.into_iter().enumerate().map(|(offset, bytes)| {
                let index = base + offset;
                tokio::task::spawn_blocking(move || {
                    rasterize_encoded(&bytes, width, detail)
                        .map_err(|source| PipelineError::Rasterize { index, source })
                })
            });

            // join_all keeps submission order, so frames land by index
            for result in join_all(tasks).await {
                frames.push(result??);
            }

            on_progress(frames.len());
            log::debug!("Rasterized {}/{} frames", frames.len(), max_frames);

            if exhausted || frames.len() >= max_frames {
                break;
            }

            tokio::time::sleep(self.config.batch_pause).await;
        }

        log::info!("Converted {} frames", frames.len());

        Ok(FrameSequence::new(frames, frame_rate, options.title.clone()))
    }
}

fn read_batch(source: &mut dyn FrameSource, count: usize) -> Result<Vec<Vec<u8>>, PipelineError> {
    let mut batch = Vec::with_capacity(count);
    while batch.len() < count {
        match source.next_frame()? {
            Some(bytes) => batch.push(bytes),
            None => break,
        }
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_frame_rate_caps() {
        assert_eq!(effective_frame_rate(30.0, 15.0), 15.0);
        assert_eq!(effective_frame_rate(12.0, 15.0), 12.0);
    }

    #[test]
    fn test_effective_frame_rate_fallback() {
        assert_eq!(effective_frame_rate(0.0, 15.0), 15.0);
        assert_eq!(effective_frame_rate(-3.0, 15.0), 15.0);
        assert_eq!(effective_frame_rate(f64::NAN, 15.0), 15.0);
    }

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_frame_rate, 15.0);
        assert_eq!(config.max_frames, 1000);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.batch_pause, Duration::from_millis(10));
    }

    struct Counting {
        remaining: usize,
    }

    impl FrameSource for Counting {
        fn next_frame(&mut self) -> Result<Option<Vec<u8>>, PipelineError> {
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            Ok(Some(vec![self.remaining as u8]))
        }
    }

    #[test]
    fn test_read_batch_stops_at_end() {
        let mut source = Counting { remaining: 3 };
        assert_eq!(read_batch(&mut source, 2).unwrap().len(), 2);
        assert_eq!(read_batch(&mut source, 2).unwrap().len(), 1);
        assert!(read_batch(&mut source, 2).unwrap().is_empty());
    }
}
