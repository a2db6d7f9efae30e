//! ShareClient - uploads a frame sequence to a running server.

use std::time::Duration;

use crate::ascii::FrameSequence;
use crate::stream::StreamMetadata;

use super::api::{CreateStreamResponse, ErrorBody};

/// Uploads can be tens of megabytes.
const SHARE_TIMEOUT: Duration = Duration::from_secs(120);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from talking to a sharing server.
#[derive(Debug, thiserror::Error)]
pub enum ShareError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Server returned status {status}: {message}")]
    Server { status: u16, message: String },
}

/// Client for the `/api/stream` endpoints of a server.
pub struct ShareClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl ShareClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ShareError> {
        let http_client = reqwest::Client::builder()
            .timeout(SHARE_TIMEOUT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Share `sequence`, returning the new stream's id and links.
    pub async fn share(&self, sequence: &FrameSequence) -> Result<CreateStreamResponse, ShareError> {
        let response = self
            .http_client
            .post(format!("{}/api/stream", self.base_url))
            .json(sequence)
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Fetch metadata for a shared stream.
    pub async fn metadata(&self, stream_id: &str) -> Result<StreamMetadata, ShareError> {
        let response = self
            .http_client
            .get(format!("{}/api/stream", self.base_url))
            .query(&[("id", stream_id)])
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ShareError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);
    Err(ShareError::Server {
        status: status.as_u16(),
        message,
    })
}
