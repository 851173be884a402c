//! Fixed-window request rate limiting.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

struct Window {
    started_at: Instant,
    count: u32,
}

/// Per-client fixed-window request counter.
///
/// One live window per client; a call that lands past the window boundary
/// replaces the window rather than merging into it. Every call mutates the
/// stored state, including calls that report "not limited". The single mutex
/// makes the read-modify-write atomic, so two requests racing at the boundary
/// cannot both slip past the quota through a lost update.
pub struct FixedWindowRateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl FixedWindowRateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Count this request against the client's current window and report
    /// whether the quota is exceeded.
    pub fn is_rate_limited(&self, client_id: &str) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.lock();

        if let Some(window) = windows.get_mut(client_id) {
            if now.duration_since(window.started_at) < self.window {
                window.count += 1;
                let limited = window.count > self.max_requests;
                if limited {
                    debug!(client = client_id, count = window.count, "Rate limit exceeded");
                }
                return limited;
            }
        }

        windows.insert(
            client_id.to_string(),
            Window {
                started_at: now,
                count: 1,
            },
        );
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn admits_quota_then_limits_within_window() {
        let limiter = FixedWindowRateLimiter::new(3, Duration::from_secs(60));

        for _ in 0..3 {
            assert!(!limiter.is_rate_limited("client"));
        }
        assert!(limiter.is_rate_limited("client"));
    }

    #[tokio::test(start_paused = true)]
    async fn window_expiry_replaces_the_window() {
        let limiter = FixedWindowRateLimiter::new(1, Duration::from_secs(60));

        assert!(!limiter.is_rate_limited("client"));
        assert!(limiter.is_rate_limited("client"));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(!limiter.is_rate_limited("client"));
    }

    #[tokio::test(start_paused = true)]
    async fn clients_are_tracked_independently() {
        let limiter = FixedWindowRateLimiter::new(1, Duration::from_secs(60));

        assert!(!limiter.is_rate_limited("a"));
        assert!(limiter.is_rate_limited("a"));
        assert!(!limiter.is_rate_limited("b"));
    }
}
