//! Route handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;

use crate::resolver::ResolvedVideo;
use crate::stream::{render_script, StreamMetadata, DEFAULT_FRAME_RATE, DEFAULT_TITLE};

use super::api::{CreateStreamRequest, CreateStreamResponse, DownloadRequest, StreamQuery};
use super::error::{ApiError, DOWNLOAD_FAILED_MESSAGE};
use super::AppState;

/// `POST /api/stream`
pub async fn create_stream(
    State(state): State<AppState>,
    payload: Result<Json<CreateStreamRequest>, JsonRejection>,
) -> Result<Json<CreateStreamResponse>, ApiError> {
    let Json(request) = payload?;

    let frames = request.frames.unwrap_or_default();
    let frame_rate = request
        .frame_rate
        .filter(|rate| rate.is_finite() && *rate > 0.0)
        .unwrap_or(DEFAULT_FRAME_RATE);
    let title = request
        .title
        .filter(|title| !title.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let id = state.store.create(frames, frame_rate, title).await?;

    Ok(Json(CreateStreamResponse {
        terminal_url: format!("curl -s {}/api/terminal/{}", state.base_url, id),
        web_url: format!("/stream/{}", id),
        stream_id: id.to_string(),
    }))
}

/// `GET /api/stream?id=...`
pub async fn stream_metadata(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Result<Json<StreamMetadata>, ApiError> {
    let id = query
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Stream ID is required".to_string()))?;

    Ok(Json(state.store.metadata(&id).await?))
}

/// `GET /api/terminal/{stream_id}`
///
/// Unknown ids get a plain-text 404 so `| bash` has nothing to run.
pub async fn terminal_script(
    State(state): State<AppState>,
    Path(stream_id): Path<String>,
) -> Response {
    let session = match state.store.get(&stream_id).await {
        Ok(session) => session,
        Err(_) => return (StatusCode::NOT_FOUND, "Stream not found").into_response(),
    };

    let headers = [
        (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"ascii_video_{}.sh\"", session.id()),
        ),
    ];
    (headers, render_script(&session)).into_response()
}

/// `POST /api/download`
pub async fn resolve_download(
    State(state): State<AppState>,
    payload: Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Json<ResolvedVideo>, ApiError> {
    let Json(request) = payload?;

    let url = request.url.unwrap_or_default();
    if url.trim().is_empty() {
        return Err(ApiError::Validation("URL is required".to_string()));
    }

    match state.resolver.resolve(&url).await {
        Ok(video) => Ok(Json(video)),
        Err(e) if e.is_validation() => Err(ApiError::Validation(e.to_string())),
        Err(e) => {
            log::error!("Video resolution failed for {}: {}", url, e);
            Err(ApiError::ExternalService(DOWNLOAD_FAILED_MESSAGE.to_string()))
        }
    }
}

/// `GET /stream/{stream_id}`
pub async fn stream_page(
    State(state): State<AppState>,
    Path(stream_id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let session = state.store.get(&stream_id).await?;
    let command = format!(
        "curl -s {}/api/terminal/{} | bash",
        state.base_url,
        session.id()
    );

    Ok(Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ background: #000; color: #0f0; font-family: monospace; padding: 2rem; }}
pre {{ background: #111; padding: 1rem; overflow-x: auto; }}
</style>
</head>
<body>
<h1>{title}</h1>
<p>{frames} frames at {fps} fps</p>
<p>Play it in your terminal:</p>
<pre>{command}</pre>
</body>
</html>
"#,
        title = escape_html(session.title()),
        frames = session.frames().len(),
        fps = session.frame_rate(),
        command = escape_html(&command),
    )))
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
