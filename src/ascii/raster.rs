//! Rasterization of decoded video frames into text frames.

use image::RgbImage;

use super::frame::TextFrame;
use super::ramp::{glyph, DetailLevel};

/// Errors that can occur while rasterizing a frame.
#[derive(Debug, thiserror::Error)]
pub enum RasterizeError {
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("target width must be at least 1 column")]
    InvalidWidth,

    #[error("failed to decode frame: {0}")]
    Decode(#[from] image::ImageError),
}

/// Row count for a `width`x`height` source rendered at `target_width` columns.
///
/// Preserves the source aspect ratio and never returns 0.
pub fn target_height(width: u32, height: u32, target_width: u32) -> u32 {
    if width == 0 {
        return 1;
    }
    let rows = (height as f64 * target_width as f64 / width as f64).round();
    (rows as u32).max(1)
}

/// Rasterize an RGB image into a frame `target_width` columns wide.
///
/// Each cell averages the source pixels it covers (box sampling, at least one
/// pixel per cell) and maps the unweighted mean of R, G and B through the
/// ramp of `level`.
pub fn rasterize(
    image: &RgbImage,
    target_width: u32,
    level: DetailLevel,
) -> Result<TextFrame, RasterizeError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(RasterizeError::EmptyImage { width, height });
    }
    if target_width == 0 {
        return Err(RasterizeError::InvalidWidth);
    }

    let rows = target_height(width, height, target_width);
    let ramp = level.ramp();

    let chars: Vec<char> = cell_brightness(image, target_width, rows)
        .into_iter()
        .map(|b| glyph(b, ramp))
        .collect();

    Ok(TextFrame::from_chars(&chars, target_width as usize))
}

/// Decode PNG or JPEG bytes and rasterize the result.
pub fn rasterize_encoded(
    bytes: &[u8],
    target_width: u32,
    level: DetailLevel,
) -> Result<TextFrame, RasterizeError> {
    let image = image::load_from_memory(bytes)?.to_rgb8();
    rasterize(&image, target_width, level)
}

/// Mean brightness (0-255) of every cell of a `cols`x`rows` grid, row-major.
fn cell_brightness(image: &RgbImage, cols: u32, rows: u32) -> Vec<f32> {
    let (img_width, img_height) = image.dimensions();

    let cell_w = img_width as f64 / cols as f64;
    let cell_h = img_height as f64 / rows as f64;

    let mut result = Vec::with_capacity(cols as usize * rows as usize);

    for cy in 0..rows {
        let (start_y, end_y) = cell_span(cy, cell_h, img_height);
        for cx in 0..cols {
            let (start_x, end_x) = cell_span(cx, cell_w, img_width);

            let mut sum = 0u64;
            let mut count = 0u64;
            for py in start_y..end_y {
                for px in start_x..end_x {
                    let [r, g, b] = image.get_pixel(px, py).0;
                    sum += r as u64 + g as u64 + b as u64;
                    count += 1;
                }
            }

            result.push((sum as f64 / (count * 3) as f64) as f32);
        }
    }

    result
}

/// Pixel range `[start, end)` covered by cell `index`; never empty.
fn cell_span(index: u32, cell_size: f64, limit: u32) -> (u32, u32) {
    let start = ((index as f64 * cell_size) as u32).min(limit - 1);
    let end = (((index + 1) as f64 * cell_size) as u32).clamp(start + 1, limit);
    (start, end)
}
