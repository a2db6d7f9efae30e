//! Text frame and frame sequence types.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One rendered ASCII frame.
///
/// Rows are joined by `\n` with no trailing separator. Frames produced by the
/// rasterizer are rectangular; frames received from clients are kept as sent
/// (a trailing newline is tolerated when counting rows).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextFrame(String);

impl TextFrame {
    /// Wrap already-joined frame text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Create a frame from a row-major character grid.
    pub fn from_chars(chars: &[char], width: usize) -> Self {
        if width == 0 || chars.is_empty() {
            return Self::default();
        }

        let text = chars
            .chunks(width)
            .map(|row| row.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n");
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Iterate over the rows of the frame.
    pub fn rows(&self) -> std::str::Lines<'_> {
        self.0.lines()
    }

    /// Width in characters (of the first row).
    pub fn width(&self) -> usize {
        self.rows().next().map_or(0, |row| row.chars().count())
    }

    /// Height in rows.
    pub fn height(&self) -> usize {
        self.rows().count()
    }

    /// True when every row has the same character count.
    pub fn is_rectangular(&self) -> bool {
        let width = self.width();
        self.rows().all(|row| row.chars().count() == width)
    }
}

impl fmt::Display for TextFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TextFrame {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for TextFrame {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

/// An ordered run of frames with playback metadata.
///
/// This is also the on-disk frames file and the share request body:
/// `{ "frames": [..], "frameRate": 15, "title": ".." }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSequence {
    pub frames: Vec<TextFrame>,
    pub frame_rate: f64,
    pub title: String,
}

impl FrameSequence {
    pub fn new(frames: Vec<TextFrame>, frame_rate: f64, title: impl Into<String>) -> Self {
        Self {
            frames,
            frame_rate,
            title: title.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// `(width, height)` of the first frame.
    pub fn dimensions(&self) -> Option<(usize, usize)> {
        self.frames.first().map(|f| (f.width(), f.height()))
    }

    /// True when every frame shares the first frame's dimensions.
    pub fn is_uniform(&self) -> bool {
        match self.dimensions() {
            Some(dims) => self.frames.iter().all(|f| (f.width(), f.height()) == dims),
            None => true,
        }
    }

    /// Time each frame stays on screen. Non-positive rates play as fast as possible;
    /// rates too small for a `Duration` saturate at [`Duration::MAX`].
    pub fn frame_delay(&self) -> Duration {
        if self.frame_rate.is_finite() && self.frame_rate > 0.0 {
            Duration::try_from_secs_f64(1.0 / self.frame_rate).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        }
    }

    /// Parse a frames file.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serialize as a frames file.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_chars_joins_rows() {
        let frame = TextFrame::from_chars(&['a', 'b', 'c', 'd', 'e', 'f'], 3);
        assert_eq!(frame.as_str(), "abc\ndef");
        assert_eq!(frame.width(), 3);
        assert_eq!(frame.height(), 2);
    }

    #[test]
    fn test_from_chars_zero_width() {
        assert_eq!(TextFrame::from_chars(&['a'], 0).as_str(), "");
    }

    #[test]
    fn test_dimensions_count_chars_not_bytes() {
        let frame = TextFrame::from_text("█▓\n░ ");
        assert_eq!(frame.width(), 2);
        assert!(frame.is_rectangular());
    }

    #[test]
    fn test_trailing_newline_is_not_a_row() {
        let frame = TextFrame::from_text("AB\nCD\n");
        assert_eq!(frame.height(), 2);
    }

    #[test]
    fn test_empty_frame() {
        let frame = TextFrame::default();
        assert_eq!(frame.width(), 0);
        assert_eq!(frame.height(), 0);
    }

    #[test]
    fn test_ragged_frame_detected() {
        assert!(!TextFrame::from_text("abc\nde").is_rectangular());
    }

    #[test]
    fn test_sequence_json_field_names() {
        let seq = FrameSequence::new(vec!["AB\nCD".into()], 24.0, "t");
        let value: serde_json::Value = serde_json::from_str(&seq.to_json().unwrap()).unwrap();
        assert_eq!(value["frames"][0], "AB\nCD");
        assert_eq!(value["frameRate"].as_f64(), Some(24.0));
        assert_eq!(value["title"], "t");
    }

    #[test]
    fn test_sequence_parse_accepts_integer_rate() {
        let seq = FrameSequence::from_json(r#"{"frames":["x"],"frameRate":12,"title":"clip"}"#).unwrap();
        assert_eq!(seq.frame_rate, 12.0);
        assert_eq!(seq.len(), 1);
    }

    #[test]
    fn test_uniform_sequence() {
        let seq = FrameSequence::new(vec!["ab\ncd".into(), "ef\ngh".into()], 10.0, "");
        assert!(seq.is_uniform());
        assert_eq!(seq.dimensions(), Some((2, 2)));

        let ragged = FrameSequence::new(vec!["ab\ncd".into(), "e".into()], 10.0, "");
        assert!(!ragged.is_uniform());
    }

    #[test]
    fn test_frame_delay() {
        let seq = FrameSequence::new(vec![], 4.0, "");
        assert_eq!(seq.frame_delay(), Duration::from_millis(250));
        let bad = FrameSequence::new(vec![], 0.0, "");
        assert_eq!(bad.frame_delay(), Duration::ZERO);
    }

    #[test]
    fn test_frame_delay_saturates_for_tiny_rate() {
        let seq = FrameSequence::new(vec!["x".into()], 1e-300, "t");
        assert_eq!(seq.frame_delay(), Duration::MAX);
    }
}
