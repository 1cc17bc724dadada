use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::RateLimitSettings;
use crate::routes::ApiError;

/// Process-local fixed window counter. One window for the whole instance:
/// the goal is shedding bursts, not per-client fairness.
#[derive(Clone)]
pub struct RateLimiter {
    window: Arc<Mutex<Window>>,
    max_requests: u32,
    window_length: Duration,
}

struct Window {
    started_at: Instant,
    count: u32,
}

impl RateLimiter {
    pub fn new(settings: RateLimitSettings) -> Self {
        Self {
            window: Arc::new(Mutex::new(Window {
                started_at: Instant::now(),
                count: 0,
            })),
            max_requests: settings.max_requests,
            window_length: Duration::from_secs(settings.window_secs),
        }
    }

    fn try_acquire(&self) -> bool {
        let mut window = self.window.lock().unwrap_or_else(|poisoned| {
            // A panic while holding the lock leaves only a counter behind,
            // which is safe to keep using.
            poisoned.into_inner()
        });
        if window.started_at.elapsed() >= self.window_length {
            window.started_at = Instant::now();
            window.count = 0;
        }
        window.count += 1;
        window.count <= self.max_requests
    }
}

pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    if !limiter.try_acquire() {
        return ApiError::too_many_requests("Too many requests, slow down").into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(RateLimitSettings {
            max_requests,
            window_secs,
        })
    }

    #[test]
    fn requests_within_the_window_pass() {
        let limiter = limiter(3, 60);
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
    }

    #[test]
    fn the_limit_plus_one_is_shed() {
        let limiter = limiter(2, 60);
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn the_counter_resets_after_the_window() {
        let limiter = limiter(1, 0);
        assert!(limiter.try_acquire());
        // Zero-length window: every call starts a fresh one.
        assert!(limiter.try_acquire());
    }
}
