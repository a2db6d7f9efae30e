//! Retry and backoff helpers for resolver requests.

use std::time::Duration;

/// Default number of retry attempts for transient network errors.
pub const DEFAULT_NETWORK_RETRIES: u32 = 2;

/// Base delay for exponential backoff (500 milliseconds).
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Maximum delay cap for exponential backoff (10 seconds).
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(10);

/// Determine if a reqwest error is a transient network error that should be retried.
///
/// Connection failures, timeouts and interrupted bodies are retried; anything
/// else is unlikely to change on a second attempt.
pub fn is_transient_network_error(error: &reqwest::Error) -> bool {
    if error.is_connect() || error.is_timeout() || error.is_body() {
        return true;
    }

    error.status().map(|s| is_transient_status(s.as_u16())).unwrap_or(false)
}

/// 502, 503 and 504 are gateway-side hiccups worth retrying.
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 502..=504)
}

/// Calculate exponential backoff delay.
///
/// `min(base * 2^attempt + base / 2, max)`, with the additive part capped at 500ms.
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    let exponential = base.saturating_mul(2u32.saturating_pow(attempt));
    let jitter_ms = (base.as_millis() as u64).min(1000);
    let jitter = Duration::from_millis(jitter_ms / 2);
    exponential.saturating_add(jitter).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_backoff_grows() {
        let base = Duration::from_millis(500);
        let max = Duration::from_secs(10);
        assert_eq!(calculate_backoff(0, base, max), Duration::from_millis(750));
        assert_eq!(calculate_backoff(1, base, max), Duration::from_millis(1250));
        assert_eq!(calculate_backoff(2, base, max), Duration::from_millis(2250));
    }

    #[test]
    fn test_calculate_backoff_respects_max() {
        let delay = calculate_backoff(20, DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_MAX);
        assert_eq!(delay, DEFAULT_BACKOFF_MAX);
    }

    #[test]
    fn test_transient_statuses() {
        assert!(is_transient_status(502));
        assert!(is_transient_status(503));
        assert!(is_transient_status(504));
        assert!(!is_transient_status(500));
        assert!(!is_transient_status(404));
    }
}
