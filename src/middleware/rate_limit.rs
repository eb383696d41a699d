//! Rate limiting middleware.
//!
//! In-memory sliding-window rate limiting per client IP, applied to the
//! /api surface. Defaults to 500 requests per 15 minutes per client.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::config::RateLimitConfig;

/// Rate limiter state tracking requests per IP.
#[derive(Clone)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    state: Arc<Mutex<HashMap<IpAddr, WindowEntry>>>,
}

struct WindowEntry {
    count: u32,
    window_start: Instant,
}

enum Decision {
    Allowed,
    Exceeded { retry_after: Duration },
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_secs),
            state: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn check(&self, ip: IpAddr) -> Decision {
        let mut state = self.state.lock();
        let now = Instant::now();

        let entry = state.entry(ip).or_insert(WindowEntry {
            count: 0,
            window_start: now,
        });

        // Reset window if expired
        if now.duration_since(entry.window_start) >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;

        if entry.count > self.max_requests {
            let reset_at = entry.window_start + self.window;
            Decision::Exceeded {
                retry_after: reset_at.duration_since(now),
            }
        } else {
            Decision::Allowed
        }
    }

    /// Periodic cleanup of stale entries (call from a background task).
    pub fn cleanup(&self) {
        let mut state = self.state.lock();
        let now = Instant::now();
        let window = self.window;

        state.retain(|_, entry| now.duration_since(entry.window_start) < window * 2);
    }
}

/// Rate limiting middleware function.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    axum::extract::State(limiter): axum::extract::State<RateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ip = addr.ip();

    match limiter.check(ip) {
        Decision::Allowed => next.run(request).await,
        Decision::Exceeded { retry_after } => {
            warn!(
                ip = %ip,
                retry_after_secs = retry_after.as_secs(),
                "Rate limit exceeded"
            );

            let body = serde_json::json!({
                "success": false,
                "error": "rate limit exceeded, please slow down",
            });

            (
                StatusCode::TOO_MANY_REQUESTS,
                [("Retry-After", retry_after.as_secs().to_string())],
                axum::Json(body),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            max_requests,
            window_secs,
        })
    }

    #[test]
    fn test_rate_limit_allows_under_limit() {
        let limiter = limiter(10, 60);
        let ip: IpAddr = "127.0.0.1".parse().unwrap();

        for _ in 0..10 {
            match limiter.check(ip) {
                Decision::Allowed => {}
                _ => panic!("Should be allowed"),
            }
        }
    }

    #[test]
    fn test_rate_limit_rejects_over_limit() {
        let limiter = limiter(5, 60);
        let ip: IpAddr = "127.0.0.1".parse().unwrap();

        for _ in 0..5 {
            match limiter.check(ip) {
                Decision::Allowed => {}
                _ => panic!("Should be allowed"),
            }
        }

        match limiter.check(ip) {
            Decision::Exceeded { .. } => {}
            _ => panic!("Should be exceeded"),
        }
    }

    #[test]
    fn test_rate_limit_tracks_ips_separately() {
        let limiter = limiter(1, 60);
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(matches!(limiter.check(a), Decision::Allowed));
        assert!(matches!(limiter.check(b), Decision::Allowed));
        assert!(matches!(limiter.check(a), Decision::Exceeded { .. }));
    }

    #[test]
    fn test_cleanup_retains_recent_entries() {
        let limiter = limiter(5, 60);
        let ip: IpAddr = "127.0.0.1".parse().unwrap();
        let _ = limiter.check(ip);

        limiter.cleanup();
        assert_eq!(limiter.state.lock().len(), 1);
    }
}
