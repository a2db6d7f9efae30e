//! HTTP service for sharing streams.
//!
//! Routes:
//! - `POST /api/stream` - share a frame sequence, returns the stream id
//! - `GET /api/stream?id=` - stream metadata
//! - `GET /api/terminal/{id}` - bash playback script
//! - `POST /api/download` - resolve a video page URL to a download link
//! - `GET /stream/{id}` - HTML page with the playback command
//! - `GET /health`

mod api;
mod client;
mod error;
mod handlers;

use std::future::Future;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;

use crate::resolver::ResolverClient;
use crate::stream::StreamStore;

pub use api::{
    CreateStreamRequest, CreateStreamResponse, DownloadRequest, ErrorBody, StreamQuery,
};
pub use client::{ShareClient, ShareError};
pub use error::{ApiError, DOWNLOAD_FAILED_MESSAGE};

/// Default request body limit (64 MiB); shared frame payloads are large.
pub const DEFAULT_BODY_LIMIT: usize = 64 * 1024 * 1024;

/// Process-wide state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: StreamStore,
    pub resolver: Arc<ResolverClient>,
    /// Public base URL used in generated links, without a trailing slash
    pub base_url: Arc<str>,
}

impl AppState {
    pub fn new(store: StreamStore, resolver: ResolverClient, base_url: &str) -> Self {
        Self {
            store,
            resolver: Arc::new(resolver),
            base_url: Arc::from(base_url.trim_end_matches('/')),
        }
    }
}

/// Build the application router.
pub fn router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route(
            "/api/stream",
            post(handlers::create_stream).get(handlers::stream_metadata),
        )
        .route("/api/terminal/:stream_id", get(handlers::terminal_script))
        .route("/api/download", post(handlers::resolve_download))
        .route("/stream/:stream_id", get(handlers::stream_page))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Serve `app` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        log::info!("Listening on http://{}", addr);
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
