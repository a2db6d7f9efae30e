//! Stream sessions and their identifiers.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use uuid::Uuid;

use crate::ascii::{FrameSequence, TextFrame};

/// Opaque stream identifier (a UUID v4 string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(String);

impl StreamId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for StreamId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Summary returned by the metadata endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamMetadata {
    pub title: String,
    pub frame_count: usize,
    pub frame_rate: f64,
}

/// A shared frame sequence held by the store until it expires.
#[derive(Debug)]
pub struct StreamSession {
    id: StreamId,
    sequence: FrameSequence,
    created_at: Instant,
}

impl StreamSession {
    pub(crate) fn new(id: StreamId, sequence: FrameSequence, created_at: Instant) -> Self {
        Self {
            id,
            sequence,
            created_at,
        }
    }

    pub fn id(&self) -> &StreamId {
        &self.id
    }

    pub fn frames(&self) -> &[TextFrame] {
        &self.sequence.frames
    }

    pub fn frame_rate(&self) -> f64 {
        self.sequence.frame_rate
    }

    pub fn title(&self) -> &str {
        &self.sequence.title
    }

    pub fn sequence(&self) -> &FrameSequence {
        &self.sequence
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn metadata(&self) -> StreamMetadata {
        StreamMetadata {
            title: self.sequence.title.clone(),
            frame_count: self.sequence.len(),
            frame_rate: self.sequence.frame_rate,
        }
    }
}
