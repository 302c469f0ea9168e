//! Per-client request limiting.
//!
//! Every client IP owns a token bucket refilled at the configured number of
//! requests per second and holding at most `max(rate, 1)` tokens. A request
//! finding its bucket empty is answered with 429 immediately.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::{Arc, Mutex},
    time::Instant,
};

/// Buckets that have refilled completely are dropped past this size.
const MAX_TRACKED_IPS: usize = 10_000;

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    refilled_at: Instant,
}

#[derive(Debug)]
pub struct RequestLimiter {
    rate: f64,
    burst: f64,
    buckets: Mutex<HashMap<IpAddr, Bucket>>,
}

impl RequestLimiter {
    /// `rate` is in requests per second and may be fractional.
    pub fn new(rate: f64) -> Self {
        Self {
            rate,
            burst: rate.max(1.0),
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Takes a token for `ip`, returning `false` when none is left.
    pub fn check(&self, ip: IpAddr) -> bool {
        self.check_at(ip, Instant::now())
    }

    fn check_at(&self, ip: IpAddr, now: Instant) -> bool {
        // A poisoned lock fails open.
        let mut buckets = match self.buckets.lock() {
            Ok(buckets) => buckets,
            Err(_) => return true,
        };

        if buckets.len() >= MAX_TRACKED_IPS && !buckets.contains_key(&ip) {
            buckets.retain(|_, bucket| self.refilled(bucket, now) < self.burst);
        }

        let bucket = buckets.entry(ip).or_insert(Bucket {
            tokens: self.burst,
            refilled_at: now,
        });
        bucket.tokens = self.refilled(bucket, now);
        bucket.refilled_at = bucket.refilled_at.max(now);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refilled(&self, bucket: &Bucket, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(bucket.refilled_at);
        (bucket.tokens + elapsed.as_secs_f64() * self.rate).min(self.burst)
    }
}

/// Middleware keyed by the peer address from `ConnectInfo`. Requests without
/// one (in-process callers) share a single bucket.
pub async fn limit_by_ip(
    State(limiter): State<Arc<RequestLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if !limiter.check(ip) {
        tracing::warn!("Request from {} rejected by limiter", ip);
        return (
            StatusCode::TOO_MANY_REQUESTS,
            "You have reached maximum request limit.",
        )
            .into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ip(addr: &str) -> IpAddr {
        addr.parse().unwrap()
    }

    #[test]
    fn test_burst_then_reject() {
        let limiter = RequestLimiter::new(3.0);
        let now = Instant::now();
        for _ in 0..3 {
            assert!(limiter.check_at(ip("10.0.0.1"), now));
        }
        assert!(!limiter.check_at(ip("10.0.0.1"), now));
    }

    #[test]
    fn test_clients_have_separate_buckets() {
        let limiter = RequestLimiter::new(1.0);
        let now = Instant::now();
        assert!(limiter.check_at(ip("10.0.0.1"), now));
        assert!(!limiter.check_at(ip("10.0.0.1"), now));
        assert!(limiter.check_at(ip("10.0.0.2"), now));
        assert!(limiter.check_at(ip("::1"), now));
    }

    #[test]
    fn test_tokens_refill_over_time() {
        let limiter = RequestLimiter::new(2.0);
        let start = Instant::now();
        assert!(limiter.check_at(ip("10.0.0.1"), start));
        assert!(limiter.check_at(ip("10.0.0.1"), start));
        assert!(!limiter.check_at(ip("10.0.0.1"), start));

        let later = start + Duration::from_millis(500);
        assert!(limiter.check_at(ip("10.0.0.1"), later));
        assert!(!limiter.check_at(ip("10.0.0.1"), later));
    }

    #[test]
    fn test_fractional_rate() {
        let limiter = RequestLimiter::new(0.5);
        let start = Instant::now();
        assert!(limiter.check_at(ip("10.0.0.1"), start));
        assert!(!limiter.check_at(ip("10.0.0.1"), start + Duration::from_secs(1)));
        assert!(limiter.check_at(ip("10.0.0.1"), start + Duration::from_secs(2)));
    }

    #[test]
    fn test_full_buckets_are_evicted() {
        let limiter = RequestLimiter::new(1.0);
        let start = Instant::now();
        for n in 0..MAX_TRACKED_IPS as u32 {
            limiter.check_at(IpAddr::V4(Ipv4Addr::from(n)), start);
        }
        let later = start + Duration::from_secs(5);
        assert!(limiter.check_at(ip("192.168.1.1"), later));
        assert_eq!(limiter.buckets.lock().unwrap().len(), 1);
    }
}
