//! ASCII rendering of video frames.
//!
//! This module turns decoded frames into text:
//!
//! 1. **Glyph mapping** - brightness to a character from a detail ramp
//! 2. **Rasterization** - box-sample an image down to a character grid
//! 3. **Frames** - [`TextFrame`] and [`FrameSequence`] containers
//!
//! # Detail Levels
//!
//! [`DetailLevel`] selects the ramp:
//! - `Low` - 10 glyphs
//! - `Medium` - 17 glyphs
//! - `High` - 63 printable ASCII glyphs
//! - `Ultra` - 94 glyphs including Unicode blocks

mod frame;
mod ramp;
mod raster;

pub use frame::{FrameSequence, TextFrame};
pub use ramp::{glyph, DetailLevel, HIGH_RAMP, LOW_RAMP, MEDIUM_RAMP, ULTRA_RAMP};
pub use raster::{rasterize, rasterize_encoded, target_height, RasterizeError};
