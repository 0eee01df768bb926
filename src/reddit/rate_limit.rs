// Rate limiting for Reddit API calls with exponential backoff.
//
// Reddit allows OAuth clients 100 queries per minute and anonymous clients
// far fewer (roughly 10). The limiter keeps a sliding window of request
// timestamps and sleeps when the window is full; `with_retry` handles the
// 429 responses that still slip through.
//
// One limiter lives inside each RedditClient and is shared by all of its
// concurrent comment fetches, so it uses interior mutability.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{info, warn};

/// A sliding-window rate limiter for API calls.
pub struct RateLimiter {
    /// Timestamps of recent requests within the current window.
    requests: Mutex<VecDeque<Instant>>,
    /// Maximum number of requests allowed per window.
    max_requests: u32,
    /// Duration of the sliding window.
    window: Duration,
    /// Minimum delay between consecutive requests to avoid bursts.
    min_delay: Duration,
    /// Timestamp of the last request (for enforcing min_delay).
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a new rate limiter.
    ///
    /// - `max_requests_per_window`: how many requests are allowed in the window
    /// - `window_seconds`: the sliding window duration in seconds
    /// - `min_delay_ms`: minimum milliseconds between consecutive requests
    pub fn new(max_requests_per_window: u32, window_seconds: u64, min_delay_ms: u64) -> Self {
        Self {
            requests: Mutex::new(VecDeque::new()),
            max_requests: max_requests_per_window,
            window: Duration::from_secs(window_seconds),
            min_delay: Duration::from_millis(min_delay_ms),
            last_request: Mutex::new(None),
        }
    }

    /// Limiter for OAuth clients: 100 requests per minute.
    pub fn oauth() -> Self {
        Self::new(100, 60, 100)
    }

    /// Limiter for the anonymous public JSON API: 10 requests per minute.
    pub fn anonymous() -> Self {
        Self::new(10, 60, 1000)
    }

    /// Wait if necessary before making a request.
    ///
    /// Enforces the minimum inter-request delay, then sleeps until the
    /// sliding window has room. Locks are never held across an await.
    pub async fn acquire(&self) {
        let min_delay_wait = {
            let last = self
                .last_request
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            (*last)
                .and_then(|t| self.min_delay.checked_sub(t.elapsed()))
                .filter(|d| !d.is_zero())
        };

        if let Some(wait) = min_delay_wait {
            tokio::time::sleep(wait).await;
        }

        loop {
            let action = {
                let now = Instant::now();
                let mut requests = self
                    .requests
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);

                while let Some(&oldest) = requests.front() {
                    if now.duration_since(oldest) > self.window {
                        requests.pop_front();
                    } else {
                        break;
                    }
                }

                match requests.front() {
                    Some(&oldest) if requests.len() as u32 >= self.max_requests => {
                        Some((oldest + self.window).saturating_duration_since(now))
                    }
                    _ => {
                        requests.push_back(now);
                        *self
                            .last_request
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner) = Some(now);
                        None
                    }
                }
            };

            match action {
                None => return,
                Some(wait) => {
                    info!(
                        delay_ms = wait.as_millis() as u64,
                        "Rate limit: waiting {}ms before next request",
                        wait.as_millis()
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }
}

/// Maximum number of retry attempts on rate-limit (429) errors.
const MAX_RETRIES: u32 = 5;

/// Base delay for exponential backoff (doubles each retry).
const BASE_BACKOFF: Duration = Duration::from_secs(2);

/// Maximum backoff delay to cap exponential growth.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// The API answered 429 Too Many Requests.
#[derive(Debug)]
pub struct RateLimitedError {
    pub path: String,
}

impl std::fmt::Display for RateLimitedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Reddit API {} returned 429 Too Many Requests", self.path)
    }
}

impl std::error::Error for RateLimitedError {}

/// Check whether an error is a rate-limit (HTTP 429) error.
///
/// Only a `RateLimitedError` anywhere in the chain counts. Message text is
/// never inspected: paths and ids can contain "429".
pub fn is_rate_limit_error(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| cause.downcast_ref::<RateLimitedError>().is_some())
}

/// Backoff before retry number `attempt` (1-based): 2s, 4s, 8s, ... capped.
fn backoff_delay(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    BASE_BACKOFF
        .saturating_mul(1u32 << exponent)
        .min(MAX_BACKOFF)
}

/// Retry an async operation with exponential backoff on rate-limit errors.
///
/// Non-rate-limit errors are returned immediately. The limiter's `acquire()`
/// runs before every attempt, retries included.
pub async fn with_retry<F, Fut, T>(rate_limiter: &RateLimiter, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0u32;

    loop {
        rate_limiter.acquire().await;

        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_rate_limit_error(&err) || attempt >= MAX_RETRIES {
                    return Err(err);
                }

                attempt += 1;

                let backoff = backoff_delay(attempt);

                // +/- 25% jitter from the clock's nanoseconds.
                let nanos = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .subsec_nanos();
                let jitter_factor = 0.75 + (nanos % 500) as f64 / 1000.0;
                let jittered = Duration::from_secs_f64(backoff.as_secs_f64() * jitter_factor);

                warn!(
                    attempt = attempt,
                    max_retries = MAX_RETRIES,
                    backoff_secs = jittered.as_secs_f64(),
                    "Rate limited (429), retrying in {:.1}s (attempt {}/{})",
                    jittered.as_secs_f64(),
                    attempt,
                    MAX_RETRIES,
                );

                tokio::time::sleep(jittered).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn limiter(max: u32, window: Duration) -> RateLimiter {
        RateLimiter {
            requests: Mutex::new(VecDeque::new()),
            max_requests: max,
            window,
            min_delay: Duration::ZERO,
            last_request: Mutex::new(None),
        }
    }

    #[test]
    fn test_presets() {
        let oauth = RateLimiter::oauth();
        assert_eq!(oauth.max_requests, 100);
        assert_eq!(oauth.window, Duration::from_secs(60));

        let anon = RateLimiter::anonymous();
        assert_eq!(anon.max_requests, 10);
        assert_eq!(anon.min_delay, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_acquire_allows_requests_under_limit() {
        let limiter = RateLimiter::new(10, 60, 0);
        for _ in 0..10 {
            limiter.acquire().await;
        }
        assert_eq!(limiter.requests.lock().unwrap().len(), 10);
        assert!(limiter.last_request.lock().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_acquire_min_delay_enforced() {
        let limiter = RateLimiter::new(1000, 60, 50);

        let start = Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        let elapsed = start.elapsed();

        assert!(
            elapsed >= Duration::from_millis(45),
            "Expected at least ~50ms delay, got {:?}",
            elapsed
        );
    }

    #[tokio::test]
    async fn test_acquire_blocks_when_window_full() {
        let limiter = limiter(3, Duration::from_millis(100));

        let start = Instant::now();
        for _ in 0..4 {
            limiter.acquire().await;
        }
        let elapsed = start.elapsed();

        assert!(
            elapsed >= Duration::from_millis(90),
            "Expected at least ~100ms wait for window expiry, got {:?}",
            elapsed
        );
    }

    #[tokio::test]
    async fn test_acquire_window_evicts_old_requests() {
        let limiter = limiter(2, Duration::from_millis(100));
        limiter.acquire().await;
        limiter.acquire().await;

        tokio::time::sleep(Duration::from_millis(150)).await;

        let start = Instant::now();
        limiter.acquire().await;
        assert!(
            start.elapsed() < Duration::from_millis(50),
            "Should not block after window expires, got {:?}",
            start.elapsed()
        );
    }

    fn rate_limited() -> anyhow::Error {
        RateLimitedError {
            path: "/r/rust/new".to_string(),
        }
        .into()
    }

    #[test]
    fn test_is_rate_limit_error() {
        assert!(is_rate_limit_error(&rate_limited()));
        assert!(!is_rate_limit_error(&anyhow::anyhow!("connection refused")));
        assert!(!is_rate_limit_error(&anyhow::anyhow!("HTTP 403 Forbidden")));
        assert!(!is_rate_limit_error(&anyhow::anyhow!("Rate Limit Exceeded")));
    }

    #[test]
    fn test_is_rate_limit_error_in_context_chain() {
        let outer = rate_limited().context("Failed to fetch comments for abc123");
        assert!(is_rate_limit_error(&outer));
    }

    #[test]
    fn test_429_in_message_is_not_rate_limit() {
        let err = anyhow::anyhow!("Reddit API /r/rust/comments/1a429z returned 404 Not Found: ")
            .context("Failed to fetch comments for 1a429z");
        assert!(!is_rate_limit_error(&err));
    }

    #[test]
    fn test_backoff_starts_at_base_and_caps() {
        assert_eq!(backoff_delay(1), Duration::from_secs(2));
        assert_eq!(backoff_delay(2), Duration::from_secs(4));
        assert_eq!(backoff_delay(3), Duration::from_secs(8));
        assert_eq!(backoff_delay(5), Duration::from_secs(32));
        assert_eq!(backoff_delay(6), MAX_BACKOFF);
        assert_eq!(backoff_delay(40), MAX_BACKOFF);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_retries_on_429_then_succeeds() {
        let limiter = RateLimiter::new(100, 60, 0);
        let call_count = AtomicU32::new(0);

        let result = with_retry(&limiter, || {
            let attempt = call_count.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(rate_limited())
                } else {
                    Ok(99)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 99);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_does_not_retry_other_errors() {
        let limiter = RateLimiter::new(100, 60, 0);
        let call_count = AtomicU32::new(0);

        let result: Result<()> = with_retry(&limiter, || {
            call_count.fetch_add(1, Ordering::SeqCst);
            async { Err(anyhow::anyhow!("Reddit API /r/rust/comments/x429 returned 404")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_retry_gives_up_after_max_retries() {
        let limiter = RateLimiter::new(100, 60, 0);
        let call_count = AtomicU32::new(0);

        let result: Result<()> = with_retry(&limiter, || {
            call_count.fetch_add(1, Ordering::SeqCst);
            async { Err(rate_limited()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(call_count.load(Ordering::SeqCst), MAX_RETRIES + 1);
    }
}
