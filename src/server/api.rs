//! Request and response bodies of the HTTP API.
//!
//! Shared by the route handlers and [`ShareClient`](super::ShareClient).

use serde::{Deserialize, Serialize};

use crate::ascii::TextFrame;

/// `POST /api/stream` body. Every field is optional on the wire so missing
/// frames can be reported as a 400 instead of a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStreamRequest {
    #[serde(default)]
    pub frames: Option<Vec<TextFrame>>,
    #[serde(default)]
    pub frame_rate: Option<f64>,
    #[serde(default)]
    pub title: Option<String>,
}

/// `POST /api/stream` reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStreamResponse {
    pub stream_id: String,
    /// `curl -s <base>/api/terminal/<id>`
    pub terminal_url: String,
    /// `/stream/<id>`
    pub web_url: String,
}

/// `GET /api/stream` query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamQuery {
    pub id: Option<String>,
}

/// `POST /api/download` body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// Error body: `{ "error": "..." }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
