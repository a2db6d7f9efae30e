//! In-memory stream session store with TTL expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::ascii::{FrameSequence, TextFrame};

use super::session::{StreamId, StreamMetadata, StreamSession};

/// How long a session lives (1 hour).
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);
/// How often the reaper sweeps (5 minutes).
pub const DEFAULT_REAP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Errors returned by the store.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("Frames are required")]
    NoFrames,

    #[error("Invalid frame rate: {0}")]
    InvalidFrameRate(f64),

    #[error("Stream not found")]
    NotFound,
}

/// Shared map of live sessions.
///
/// Cloning is cheap; every clone sees the same sessions.
#[derive(Debug, Clone)]
pub struct StreamStore {
    sessions: Arc<Mutex<HashMap<StreamId, Arc<StreamSession>>>>,
    ttl: Duration,
}

impl Default for StreamStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl StreamStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Store a new session and return its id.
    pub async fn create(
        &self,
        frames: Vec<TextFrame>,
        frame_rate: f64,
        title: impl Into<String>,
    ) -> Result<StreamId, StreamError> {
        if frames.is_empty() {
            return Err(StreamError::NoFrames);
        }
        if !(frame_rate.is_finite() && frame_rate > 0.0) {
            return Err(StreamError::InvalidFrameRate(frame_rate));
        }

        let sequence = FrameSequence::new(frames, frame_rate, title);
        let frame_count = sequence.len();

        let mut sessions = self.sessions.lock().await;
        let id = loop {
            let candidate = StreamId::generate();
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };
        let session = StreamSession::new(id.clone(), sequence, Instant::now());
        sessions.insert(id.clone(), Arc::new(session));
        drop(sessions);

        log::info!(
            "Created stream {} ({} frames at {} fps)",
            id,
            frame_count,
            frame_rate
        );
        Ok(id)
    }

    /// Look up a session.
    ///
    /// Expired sessions stay visible until the next sweep removes them.
    pub async fn get(&self, id: &str) -> Result<Arc<StreamSession>, StreamError> {
        self.sessions
            .lock()
            .await
            .get(id)
            .cloned()
            .ok_or(StreamError::NotFound)
    }

    pub async fn metadata(&self, id: &str) -> Result<StreamMetadata, StreamError> {
        Ok(self.get(id).await?.metadata())
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Remove sessions older than the TTL, returning how many were removed.
    pub async fn reap_expired(&self) -> usize {
        let now = Instant::now();
        let ttl = self.ttl;

        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| now.duration_since(session.created_at()) <= ttl);
        before - sessions.len()
    }

    /// Start a background task that calls [`StreamStore::reap_expired`]
    /// every `interval` until the returned [`Reaper`] is shut down or dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_reaper(&self, interval: Duration) -> Reaper {
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(reap_loop(self.clone(), interval, cancel_token.clone()));

        Reaper {
            handle: Some(handle),
            cancel_token,
        }
    }
}

/// Handle to the background sweep task.
#[derive(Debug)]
pub struct Reaper {
    handle: Option<JoinHandle<()>>,
    cancel_token: CancellationToken,
}

impl Reaper {
    /// Stop the sweep task and wait for it to exit.
    pub async fn shutdown(mut self) -> Result<(), JoinError> {
        self.cancel_token.cancel();
        match self.handle.take() {
            Some(handle) => handle.await,
            None => Ok(()),
        }
    }
}

impl Drop for Reaper {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn reap_loop(store: StreamStore, interval: Duration, cancel_token: CancellationToken) {
    // tokio intervals panic on a zero period
    let interval = interval.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = store.reap_expired().await;
                if removed > 0 {
                    log::info!("Reaped {} expired streams", removed);
                } else {
                    log::debug!("Reaper sweep found no expired streams");
                }
            }
            _ = cancel_token.cancelled() => {
                log::debug!("Stream reaper shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(texts: &[&str]) -> Vec<TextFrame> {
        texts.iter().map(|t| TextFrame::from(*t)).collect()
    }

    #[tokio::test]
    async fn test_create_rejects_empty_frames() {
        let store = StreamStore::default();
        let result = store.create(Vec::new(), 24.0, "t").await;
        assert!(matches!(result, Err(StreamError::NoFrames)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_rate() {
        let store = StreamStore::default();
        let result = store.create(frames(&["x"]), 0.0, "t").await;
        assert!(matches!(result, Err(StreamError::InvalidFrameRate(_))));
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let store = StreamStore::default();
        let id = store.create(frames(&["AB\nCD"]), 24.0, "t").await.unwrap();

        let session = store.get(id.as_str()).await.unwrap();
        assert_eq!(session.id(), &id);
        assert_eq!(session.title(), "t");
        assert_eq!(session.frames().len(), 1);
        assert_eq!(session.frame_rate(), 24.0);
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let store = StreamStore::default();
        assert!(matches!(store.get("nope").await, Err(StreamError::NotFound)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reap_respects_ttl() {
        let store = StreamStore::new(Duration::from_secs(10));
        store.create(frames(&["x"]), 1.0, "").await.unwrap();

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(store.reap_expired().await, 0);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(store.reap_expired().await, 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaper_shutdown() {
        let store = StreamStore::default();
        let reaper = store.spawn_reaper(Duration::from_secs(1));
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(reaper.shutdown().await.is_ok());
    }
}
