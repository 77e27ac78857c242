//! Per-client token-bucket rate limiting for the public storefront.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;

const PRUNE_THRESHOLD: usize = 10_000;
const IDLE_AFTER: Duration = Duration::from_secs(120);

/// A simple token bucket rate limiter.
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Buckets keyed by client IP. Limits are passed per check so a config
/// reload takes effect immediately.
#[derive(Default)]
pub struct RateLimiterState {
    buckets: Mutex<HashMap<IpAddr, TokenBucket>>,
}

impl RateLimiterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&self, client: IpAddr, rps: u32, burst: u32) -> bool {
        let capacity = f64::from(burst.max(1));
        let Ok(mut buckets) = self.buckets.lock() else {
            tracing::error!("Rate limiter state poisoned; allowing request");
            return true;
        };
        if buckets.len() > PRUNE_THRESHOLD {
            let now = Instant::now();
            buckets.retain(|_, b| now.duration_since(b.last_update) < IDLE_AFTER);
        }
        buckets
            .entry(client)
            .or_insert_with(|| TokenBucket::new(capacity))
            .try_acquire(capacity, f64::from(rps))
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.lock().map(|b| b.len()).unwrap_or(0)
    }
}

/// Middleware limiting storefront requests per client IP.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let Some(client) = client else {
        return next.run(request).await;
    };

    let runtime = state.snapshot();
    let storefront = &runtime.config.storefront;
    if state
        .limiter
        .check(client, storefront.requests_per_second, storefront.burst_size)
    {
        next.run(request).await
    } else {
        tracing::warn!(client = %client, "Storefront rate limit exceeded");
        metrics::record_rate_limited("storefront");
        ApiError::RateLimited.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_burst_then_reject() {
        let limiter = RateLimiterState::new();
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        for _ in 0..3 {
            assert!(limiter.check(ip, 1, 3));
        }
        assert!(!limiter.check(ip, 1, 3));

        let other = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));
        assert!(limiter.check(other, 1, 3));
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_refill() {
        let limiter = RateLimiterState::new();
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        assert!(limiter.check(ip, 1000, 1));
        assert!(!limiter.check(ip, 1000, 1));
        std::thread::sleep(Duration::from_millis(5));
        assert!(limiter.check(ip, 1000, 1));
    }
}
