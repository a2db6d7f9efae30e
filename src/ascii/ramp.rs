//! Glyph ramps and brightness to glyph mapping.

use serde::{Deserialize, Serialize};

/// Low detail ramp (10 levels).
/// Characters ordered from sparsest (space) to densest (@).
pub const LOW_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Medium detail ramp (17 levels).
pub const MEDIUM_RAMP: &[char] = &[
    ' ', '.', ':', ';', '!', '>', '<', '+', '=', '?', '7', '9', '$', '&', '%', 'B', '@',
];

/// High detail ramp (63 levels), printable ASCII only.
pub const HIGH_RAMP: &[char] = &[
    ' ', '.', '`', '^', '"', ',', ':', ';', 'I', 'l', '!', 'i',
    '>', '<', '~', '+', '_', '-', '?', ']', '}', '|', ')', '(',
    '1', 't', 'f', 'j', 'r', 'x', 'n', 'u', 'v', 'c', 'z', 'X',
    'Y', 'U', 'J', 'C', 'L', 'Q', 'O', 'Z', 'm', 'w', 'q', 'p',
    'd', 'b', 'k', 'h', 'a', 'o', '*', '#', 'M', 'W', '&', '8',
    '%', 'B', '@',
];

/// Ultra detail ramp (94 levels).
/// The high ramp followed by Unicode block, geometric and card glyphs,
/// so it needs a terminal font that covers them.
pub const ULTRA_RAMP: &[char] = &[
    ' ', '.', '`', '^', '"', ',', ':', ';', 'I', 'l', '!', 'i',
    '>', '<', '~', '+', '_', '-', '?', ']', '}', '|', ')', '(',
    '1', 't', 'f', 'j', 'r', 'x', 'n', 'u', 'v', 'c', 'z', 'X',
    'Y', 'U', 'J', 'C', 'L', 'Q', 'O', 'Z', 'm', 'w', 'q', 'p',
    'd', 'b', 'k', 'h', 'a', 'o', '*', '#', 'M', 'W', '&', '8',
    '%', 'B', '@', '█', '▉', '▊', '▋', '▌', '▍', '▎', '▏', '▓',
    '▒', '░', '■', '□', '▪', '▫', '●', '○', '◆', '◇', '◼', '◻',
    '▲', '△', '▼', '▽', '◀', '▶', '♠', '♣', '♥', '♦',
];

// glyph() indexes with len - 1, so a ramp needs two entries to span 0..=255.
const _: () = assert!(LOW_RAMP.len() >= 2);
const _: () = assert!(MEDIUM_RAMP.len() >= 2);
const _: () = assert!(HIGH_RAMP.len() >= 2);
const _: () = assert!(ULTRA_RAMP.len() >= 2);

/// Detail level selecting the glyph ramp used for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    /// 10-level ramp
    Low,
    /// 17-level ramp
    #[default]
    Medium,
    /// 63-level printable ASCII ramp
    High,
    /// 94-level ramp with Unicode glyphs
    Ultra,
}

impl DetailLevel {
    /// Every level, sparsest ramp first.
    pub const ALL: [DetailLevel; 4] = [
        DetailLevel::Low,
        DetailLevel::Medium,
        DetailLevel::High,
        DetailLevel::Ultra,
    ];

    /// Get the glyph ramp for this level.
    pub fn ramp(&self) -> &'static [char] {
        match self {
            DetailLevel::Low => LOW_RAMP,
            DetailLevel::Medium => MEDIUM_RAMP,
            DetailLevel::High => HIGH_RAMP,
            DetailLevel::Ultra => ULTRA_RAMP,
        }
    }

    /// Get a human-readable name for the level.
    pub fn name(&self) -> &'static str {
        match self {
            DetailLevel::Low => "low",
            DetailLevel::Medium => "medium",
            DetailLevel::High => "high",
            DetailLevel::Ultra => "ultra",
        }
    }

    /// Parse a level from its name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        DetailLevel::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl std::fmt::Display for DetailLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Map a brightness value to a glyph from `ramp`.
///
/// `index = floor(brightness / 255 * (len - 1))`, so 0 maps to the first
/// glyph and 255 to the last. Values outside `[0, 255]` (and NaN) are
/// clamped. An empty ramp yields a space.
///
/// # Example
/// ```
/// use ascii_stream::ascii::{glyph, LOW_RAMP};
///
/// assert_eq!(glyph(0.0, LOW_RAMP), ' ');
/// assert_eq!(glyph(127.0, LOW_RAMP), '=');
/// assert_eq!(glyph(255.0, LOW_RAMP), '@');
/// ```
#[inline]
pub fn glyph(brightness: f32, ramp: &[char]) -> char {
    let Some(last) = ramp.len().checked_sub(1) else {
        return ' ';
    };

    let brightness = if brightness.is_nan() {
        0.0
    } else {
        brightness.clamp(0.0, 255.0)
    };

    let index = ((brightness / 255.0) * last as f32).floor() as usize;
    ramp[index.min(last)]
}
