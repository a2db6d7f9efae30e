//! Integration tests for the conversion pipeline.
//!
//! These tests drive `Converter` with an in-memory extractor and verify:
//! - Frame-rate capping and the extraction plan
//! - Batching, ordering and progress reporting
//! - The max-frames bound
//! - Cancellation and failure propagation

use std::io::Cursor;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ascii_stream::ascii::DetailLevel;
use ascii_stream::pipeline::{
    ConvertOptions, Converter, ExtractPlan, FrameExtractor, FrameSource, PipelineConfig,
    PipelineError,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tokio_util::sync::CancellationToken;

const WIDTH: u32 = 20;

/// PNG whose first `lit` columns are white and the rest black.
fn bar_png(lit: u32) -> Vec<u8> {
    let mut image = RgbImage::from_pixel(WIDTH, 2, Rgb([0, 0, 0]));
    for x in 0..lit.min(WIDTH) {
        for y in 0..2 {
            image.put_pixel(x, y, Rgb([255, 255, 255]));
        }
    }
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Expected low-detail text for `bar_png(lit)` at WIDTH columns.
fn bar_text(lit: u32) -> String {
    let row = format!("{}{}", "@".repeat(lit as usize), " ".repeat((WIDTH - lit) as usize));
    format!("{}\n{}", row, row)
}

struct MemoryExtractor {
    frames: Vec<Vec<u8>>,
    plans: Mutex<Vec<ExtractPlan>>,
    fail: bool,
}

impl MemoryExtractor {
    fn new(frames: Vec<Vec<u8>>) -> Arc<Self> {
        Arc::new(Self {
            frames,
            plans: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            frames: Vec::new(),
            plans: Mutex::new(Vec::new()),
            fail: true,
        })
    }
}

impl FrameExtractor for MemoryExtractor {
    fn extract(&self, _source: &Path, plan: &ExtractPlan) -> Result<Box<dyn FrameSource>, PipelineError> {
        self.plans.lock().unwrap().push(*plan);
        if self.fail {
            return Err(PipelineError::ExtractionFailed {
                exit_code: Some(1),
                stderr: "moov atom not found".to_string(),
            });
        }
        Ok(Box::new(MemorySource {
            frames: self.frames.clone().into_iter(),
        }))
    }
}

struct MemorySource {
    frames: std::vec::IntoIter<Vec<u8>>,
}

impl FrameSource for MemorySource {
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>, PipelineError> {
        Ok(self.frames.next())
    }
}

/// Fails extraction after firing the token, like ffmpeg killed by Ctrl+C.
struct InterruptedExtractor {
    cancel_token: CancellationToken,
}

impl FrameExtractor for InterruptedExtractor {
    fn extract(&self, _source: &Path, _plan: &ExtractPlan) -> Result<Box<dyn FrameSource>, PipelineError> {
        self.cancel_token.cancel();
        Err(PipelineError::ExtractionFailed {
            exit_code: Some(255),
            stderr: "Exiting normally, received signal 2.".to_string(),
        })
    }
}

fn config(batch_size: usize, max_frames: usize) -> PipelineConfig {
    PipelineConfig {
        max_frame_rate: 15.0,
        max_frames,
        batch_size,
        batch_pause: Duration::ZERO,
    }
}

fn options(frame_rate: f64) -> ConvertOptions {
    ConvertOptions {
        target_width: WIDTH,
        frame_rate,
        detail: DetailLevel::Low,
        max_frames: None,
        title: "bars".to_string(),
    }
}

// ==================== Plan Tests ====================

#[tokio::test]
async fn test_frame_rate_capped_in_plan_and_output() {
    let extractor = MemoryExtractor::new(vec![bar_png(1)]);
    let converter = Converter::new(extractor.clone(), config(10, 1000));

    let sequence = converter
        .convert(Path::new("in.mp4"), &options(30.0), |_| {})
        .await
        .unwrap();

    assert_eq!(sequence.frame_rate, 15.0);
    let plans = extractor.plans.lock().unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].frame_rate, 15.0);
    assert_eq!(plans[0].max_frames, 1000);
    assert_eq!(plans[0].scale_width, Some(WIDTH));
}

#[tokio::test]
async fn test_slow_source_keeps_its_rate() {
    let extractor = MemoryExtractor::new(vec![bar_png(1)]);
    let converter = Converter::new(extractor, config(10, 1000));

    let sequence = converter
        .convert(Path::new("in.mp4"), &options(8.0), |_| {})
        .await
        .unwrap();

    assert_eq!(sequence.frame_rate, 8.0);
    assert_eq!(sequence.title, "bars");
}

// ==================== Batching Tests ====================

#[tokio::test]
async fn test_frames_in_sampling_order() {
    let frames = (0..12).map(bar_png).collect();
    let converter = Converter::new(MemoryExtractor::new(frames), config(5, 1000));

    let sequence = converter
        .convert(Path::new("in.mp4"), &options(10.0), |_| {})
        .await
        .unwrap();

    assert_eq!(sequence.len(), 12);
    for (i, frame) in sequence.frames.iter().enumerate() {
        assert_eq!(frame.as_str(), bar_text(i as u32), "frame {}", i);
    }
    assert!(sequence.is_uniform());
}

#[tokio::test]
async fn test_progress_after_each_batch() {
    let frames = (0..7).map(bar_png).collect();
    let converter = Converter::new(MemoryExtractor::new(frames), config(3, 1000));

    let mut progress = Vec::new();
    let sequence = converter
        .convert(Path::new("in.mp4"), &options(10.0), |done| progress.push(done))
        .await
        .unwrap();

    assert_eq!(sequence.len(), 7);
    assert_eq!(progress, vec![3, 6, 7]);
}

#[tokio::test]
async fn test_max_frames_reached_exactly() {
    let frames = (0..25).map(|i| bar_png(i % WIDTH)).collect();
    let converter = Converter::new(MemoryExtractor::new(frames), config(10, 20));

    let mut progress = Vec::new();
    let sequence = converter
        .convert(Path::new("in.mp4"), &options(10.0), |done| progress.push(done))
        .await
        .unwrap();

    assert_eq!(sequence.len(), 20);
    assert_eq!(progress, vec![10, 20]);
    assert_eq!(sequence.frames[19].as_str(), bar_text(19));
}

#[tokio::test]
async fn test_option_overrides_max_frames() {
    let frames = (0..10).map(bar_png).collect();
    let converter = Converter::new(MemoryExtractor::new(frames), config(4, 1000));

    let mut opts = options(10.0);
    opts.max_frames = Some(5);
    let sequence = converter
        .convert(Path::new("in.mp4"), &opts, |_| {})
        .await
        .unwrap();

    assert_eq!(sequence.len(), 5);
}

#[tokio::test]
async fn test_empty_source_gives_empty_sequence() {
    let converter = Converter::new(MemoryExtractor::new(Vec::new()), config(10, 1000));

    let mut progress = Vec::new();
    let sequence = converter
        .convert(Path::new("in.mp4"), &options(10.0), |done| progress.push(done))
        .await
        .unwrap();

    assert!(sequence.is_empty());
    assert!(progress.is_empty());
}

// ==================== Cancellation Tests ====================

#[tokio::test]
async fn test_cancelled_before_start() {
    let converter = Converter::new(MemoryExtractor::new(vec![bar_png(1)]), config(10, 1000));
    let token = CancellationToken::new();
    token.cancel();

    let result = converter
        .convert_with_cancel(Path::new("in.mp4"), &options(10.0), &token, |_| {})
        .await;

    assert!(matches!(result, Err(PipelineError::Cancelled)));
}

#[tokio::test]
async fn test_cancelled_between_batches() {
    let frames = (0..9).map(bar_png).collect();
    let converter = Converter::new(MemoryExtractor::new(frames), config(3, 1000));
    let token = CancellationToken::new();
    let trigger = token.clone();

    let mut progress = Vec::new();
    let result = converter
        .convert_with_cancel(Path::new("in.mp4"), &options(10.0), &token, |done| {
            progress.push(done);
            trigger.cancel();
        })
        .await;

    assert!(matches!(result, Err(PipelineError::Cancelled)));
    assert_eq!(progress, vec![3]);
}

#[tokio::test]
async fn test_extraction_interrupted_by_cancel_reports_cancelled() {
    let token = CancellationToken::new();
    let extractor = Arc::new(InterruptedExtractor {
        cancel_token: token.clone(),
    });
    let converter = Converter::new(extractor, config(10, 1000));

    let result = converter
        .convert_with_cancel(Path::new("in.mp4"), &options(10.0), &token, |_| {})
        .await;

    assert!(matches!(result, Err(PipelineError::Cancelled)));
}

// ==================== Failure Tests ====================

#[tokio::test]
async fn test_undecodable_frame_aborts_with_index() {
    let mut frames: Vec<Vec<u8>> = (0..6).map(bar_png).collect();
    frames[4] = b"garbage".to_vec();
    let converter = Converter::new(MemoryExtractor::new(frames), config(3, 1000));

    let result = converter
        .convert(Path::new("in.mp4"), &options(10.0), |_| {})
        .await;

    match result {
        Err(PipelineError::Rasterize { index, .. }) => assert_eq!(index, 4),
        other => panic!("Expected Rasterize error, got {:?}", other.map(|s| s.len())),
    }
}

#[tokio::test]
async fn test_extractor_failure_propagates() {
    let converter = Converter::new(MemoryExtractor::failing(), config(10, 1000));

    let result = converter
        .convert(Path::new("in.mp4"), &options(10.0), |_| {})
        .await;

    assert!(matches!(result, Err(PipelineError::ExtractionFailed { .. })));
}

#[tokio::test]
async fn test_zero_width_rejected_before_extraction() {
    let extractor = MemoryExtractor::new(vec![bar_png(1)]);
    let converter = Converter::new(extractor.clone(), config(10, 1000));

    let mut opts = options(10.0);
    opts.target_width = 0;
    let result = converter.convert(Path::new("in.mp4"), &opts, |_| {}).await;

    assert!(matches!(result, Err(PipelineError::InvalidOptions(_))));
    assert!(extractor.plans.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_non_positive_max_frame_rate_rejected() {
    for max_frame_rate in [0.0, -15.0, f64::NAN, f64::INFINITY] {
        let extractor = MemoryExtractor::new(vec![bar_png(1)]);
        let mut limits = config(10, 1000);
        limits.max_frame_rate = max_frame_rate;
        let converter = Converter::new(extractor.clone(), limits);

        let result = converter
            .convert(Path::new("in.mp4"), &options(30.0), |_| {})
            .await;

        assert!(
            matches!(result, Err(PipelineError::InvalidOptions(_))),
            "max frame rate {}",
            max_frame_rate
        );
        assert!(extractor.plans.lock().unwrap().is_empty());
    }
}
