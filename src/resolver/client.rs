//! ResolverClient - turns a public video page URL into a downloadable file.
//!
//! The resolution service speaks a two-step form API:
//!
//! 1. `POST /api/ajaxSearch/index` with `q=<url>&vt=home` returns the video
//!    id, title, duration and a map of formats, each carrying a key `k`.
//! 2. `POST /api/ajaxConvert/index` with `vid=<id>&k=<key>` returns `dlink`,
//!    the direct download URL.
//!
//! Both replies carry `"status": "ok"` on success. Anything else is reported
//! as an error; the service is best effort and its shape is not guaranteed.

use std::path::Path;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use crate::pipeline::MAX_SOURCE_BYTES;

use super::retry::{
    calculate_backoff, is_transient_network_error, is_transient_status, DEFAULT_BACKOFF_BASE,
    DEFAULT_BACKOFF_MAX, DEFAULT_NETWORK_RETRIES,
};

/// Default base URL for the resolution service.
pub const DEFAULT_RESOLVER_BASE_URL: &str = "https://yt1s.com";

const SEARCH_PATH: &str = "/api/ajaxSearch/index";
const CONVERT_PATH: &str = "/api/ajaxConvert/index";

/// Default timeout for HTTP requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A resolved video, as returned by the download endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedVideo {
    pub title: String,
    pub download_url: String,
    /// Duration in seconds, when the service reports one
    pub duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    mess: Option<String>,
    #[serde(default)]
    vid: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    t: Option<Value>,
    #[serde(default)]
    links: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ConvertResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    mess: Option<String>,
    #[serde(default)]
    dlink: Option<String>,
}

/// Client for the URL resolution service.
pub struct ResolverClient {
    base_url: String,
    http_client: reqwest::Client,
    max_download_bytes: u64,
}

impl ResolverClient {
    /// Create a client for the default service.
    pub fn new() -> Result<Self, ResolveError> {
        Self::with_base_url(DEFAULT_RESOLVER_BASE_URL)
    }

    /// Create a client for a service at `base_url` (used by tests to point
    /// at a mock server).
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ResolveError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ResolveError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
            max_download_bytes: MAX_SOURCE_BYTES,
        })
    }

    /// Override the download size limit.
    pub fn with_max_download_bytes(mut self, limit: u64) -> Self {
        self.max_download_bytes = limit;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve `url` to a direct download link.
    pub async fn resolve(&self, url: &str) -> Result<ResolvedVideo, ResolveError> {
        let url = validate_url(url)?;

        let search: SearchResponse = self
            .post_form(SEARCH_PATH, &[("q", url), ("vt", "home")])
            .await?;
        if search.status != "ok" {
            return Err(ResolveError::Rejected(
                search.mess.unwrap_or_else(|| format!("search status '{}'", search.status)),
            ));
        }

        let vid = search
            .vid
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ResolveError::UnexpectedResponse("search reply has no vid".to_string()))?;
        let key = search
            .links
            .as_ref()
            .and_then(|links| links.get("mp4"))
            .and_then(first_format_key)
            .ok_or_else(|| ResolveError::UnexpectedResponse("no mp4 format offered".to_string()))?;

        log::debug!("Resolved {} to vid {} (format key {})", url, vid, key);

        let convert: ConvertResponse = self
            .post_form(CONVERT_PATH, &[("vid", vid.as_str()), ("k", key.as_str())])
            .await?;
        if convert.status != "ok" {
            return Err(ResolveError::Rejected(
                convert.mess.unwrap_or_else(|| format!("convert status '{}'", convert.status)),
            ));
        }

        let download_url = convert
            .dlink
            .filter(|d| !d.is_empty())
            .ok_or_else(|| ResolveError::UnexpectedResponse("convert reply has no dlink".to_string()))?;

        Ok(ResolvedVideo {
            title: search.title.unwrap_or_default(),
            download_url,
            duration: search.t.as_ref().and_then(duration_seconds),
        })
    }

    /// [`ResolverClient::resolve`] with retries on transient network errors.
    pub async fn resolve_with_retry(&self, url: &str) -> Result<ResolvedVideo, ResolveError> {
        self.resolve_with_retry_config(url, DEFAULT_NETWORK_RETRIES, DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_MAX)
            .await
    }

    pub async fn resolve_with_retry_config(
        &self,
        url: &str,
        max_retries: u32,
        backoff_base: Duration,
        backoff_max: Duration,
    ) -> Result<ResolvedVideo, ResolveError> {
        let mut last_error_msg = String::new();

        for attempt in 0..=max_retries {
            match self.resolve(url).await {
                Ok(video) => return Ok(video),
                Err(e) if e.is_transient() => {
                    last_error_msg = e.to_string();

                    if attempt >= max_retries {
                        log::error!(
                            "Network error after {} attempts. Giving up. Error: {}",
                            attempt + 1,
                            e
                        );
                        break;
                    }

                    let delay = calculate_backoff(attempt, backoff_base, backoff_max);
                    log::warn!(
                        "Network error (attempt {}/{}): {}. Retrying in {:?}...",
                        attempt + 1,
                        max_retries + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }

        Err(ResolveError::NetworkError {
            message: last_error_msg,
            attempts: max_retries + 1,
        })
    }

    /// Stream the file at `url` to `dest`, returning the byte count.
    ///
    /// Fails with [`ResolveError::TooLarge`] once the body exceeds the
    /// download limit. The partial file is removed on any failure.
    pub async fn download(&self, url: &str, dest: &Path) -> Result<u64, ResolveError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = self.http_client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ResolveError::Status { status, body });
        }

        let limit = self.max_download_bytes;
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(ResolveError::TooLarge { limit });
        }

        let chunks = response.bytes_stream().map(|chunk| chunk.map_err(ResolveError::from));
        let written = write_limited(dest, chunks, limit).await?;
        log::info!("Downloaded {} bytes to {}", written, dest.display());

        Ok(written)
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T, ResolveError> {
        let response = self
            .http_client
            .post(format!("{}{}", self.base_url, path))
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResolveError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ResolveError::UnexpectedResponse(e.to_string()))
    }
}

/// Reject blank and non-http(s) URLs before contacting the service.
pub fn validate_url(url: &str) -> Result<&str, ResolveError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(ResolveError::EmptyUrl);
    }

    let parsed = reqwest::Url::parse(trimmed).map_err(|e| ResolveError::InvalidUrl(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ResolveError::InvalidUrl(format!(
            "unsupported scheme '{}'",
            parsed.scheme()
        )));
    }

    Ok(trimmed)
}

/// Write `chunks` to `dest`, failing once more than `limit` bytes arrive.
///
/// `dest` is removed again when writing fails for any reason.
async fn write_limited<S, B>(dest: &Path, chunks: S, limit: u64) -> Result<u64, ResolveError>
where
    S: Stream<Item = Result<B, ResolveError>>,
    B: AsRef<[u8]>,
{
    futures_util::pin_mut!(chunks);
    let mut file = tokio::fs::File::create(dest).await?;

    let result = async {
        let mut written = 0u64;
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            let chunk = chunk.as_ref();
            written += chunk.len() as u64;
            if written > limit {
                return Err(ResolveError::TooLarge { limit });
            }
            file.write_all(chunk).await?;
        }
        file.flush().await?;
        Ok::<u64, ResolveError>(written)
    }
    .await;

    if result.is_err() {
        drop(file);
        if let Err(e) = tokio::fs::remove_file(dest).await {
            log::warn!("Failed to remove partial download {}: {}", dest.display(), e);
        }
    }
    result
}

/// First format key `k` found under the `mp4` links, in document order.
fn first_format_key(formats: &Value) -> Option<String> {
    match formats {
        Value::Object(map) => {
            if let Some(k) = map.get("k").and_then(Value::as_str) {
                return Some(k.to_string());
            }
            map.values().find_map(first_format_key)
        }
        Value::Array(items) => items.iter().find_map(first_format_key),
        _ => None,
    }
}

/// The service reports duration as seconds, either a number or a string.
fn duration_seconds(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Errors that can occur while resolving or downloading a video.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("URL is required")]
    EmptyUrl,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Service rejected the request: {0}")]
    Rejected(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Network error: {message} (after {attempts} attempts)")]
    NetworkError {
        /// Human-readable network error message
        message: String,
        /// Number of attempts made before giving up
        attempts: u32,
    },

    #[error("Video exceeds the {limit} byte download limit")]
    TooLarge { limit: u64 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ResolveError {
    /// True when the caller supplied a bad URL.
    pub fn is_validation(&self) -> bool {
        matches!(self, ResolveError::EmptyUrl | ResolveError::InvalidUrl(_))
    }

    /// True for failures a retry may fix.
    pub fn is_transient(&self) -> bool {
        match self {
            ResolveError::HttpError(e) => is_transient_network_error(e),
            ResolveError::Status { status, .. } => is_transient_status(*status),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_with_base_url_trims_slash() {
        let client = ResolverClient::with_base_url("http://localhost:9999/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:9999");
    }

    #[test]
    fn test_default_base_url() {
        let client = ResolverClient::new().unwrap();
        assert_eq!(client.base_url(), DEFAULT_RESOLVER_BASE_URL);
    }

    #[test]
    fn test_validate_url() {
        assert!(matches!(validate_url("   "), Err(ResolveError::EmptyUrl)));
        assert!(matches!(validate_url("not a url"), Err(ResolveError::InvalidUrl(_))));
        assert!(matches!(validate_url("ftp://x.com/v"), Err(ResolveError::InvalidUrl(_))));
        assert_eq!(
            validate_url(" https://example.com/watch?v=1 ").unwrap(),
            "https://example.com/watch?v=1"
        );
    }

    #[test]
    fn test_first_format_key_shapes() {
        let keyed = json!({"18": {"k": "abc", "q": "360p"}});
        assert_eq!(first_format_key(&keyed), Some("abc".to_string()));

        let nested = json!({"mp4": [{"k": "first"}, {"k": "second"}]});
        assert_eq!(first_format_key(&nested), Some("first".to_string()));

        assert_eq!(first_format_key(&json!({})), None);
        assert_eq!(first_format_key(&json!("k")), None);
    }

    #[test]
    fn test_first_format_key_follows_document_order() {
        let links: Value =
            serde_json::from_str(r#"{"137": {"k": "key-1080"}, "18": {"k": "key-360"}}"#).unwrap();
        assert_eq!(first_format_key(&links), Some("key-1080".to_string()));
    }

    #[tokio::test]
    async fn test_interrupted_download_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("video.mp4");
        let chunks = futures_util::stream::iter(vec![
            Ok(b"first".to_vec()),
            Err(ResolveError::UnexpectedResponse("connection reset".to_string())),
        ]);

        let result = write_limited(&dest, chunks, 1024).await;

        assert!(matches!(result, Err(ResolveError::UnexpectedResponse(_))));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_oversized_download_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("video.mp4");
        let chunks = futures_util::stream::iter(vec![
            Ok::<_, ResolveError>(vec![0u8; 8]),
            Ok(vec![0u8; 8]),
        ]);

        let result = write_limited(&dest, chunks, 10).await;

        assert!(matches!(result, Err(ResolveError::TooLarge { limit: 10 })));
        assert!(!dest.exists());
    }

    #[test]
    fn test_duration_seconds() {
        assert_eq!(duration_seconds(&json!(212)), Some(212.0));
        assert_eq!(duration_seconds(&json!("95")), Some(95.0));
        assert_eq!(duration_seconds(&json!(null)), None);
    }

    #[test]
    fn test_error_classification() {
        assert!(ResolveError::EmptyUrl.is_validation());
        assert!(!ResolveError::Rejected("x".into()).is_validation());
        assert!(ResolveError::Status { status: 503, body: String::new() }.is_transient());
        assert!(!ResolveError::Status { status: 404, body: String::new() }.is_transient());
    }
}
