//! Fixed-window rate limiting keyed by client IP.
//!
//! Advisory throttle on the public auth/OTP surface; not part of the OTP
//! state machine. Each limiter instance owns its own window map, so
//! different route groups get independent budgets.
//!
//! Client IP resolution prefers proxy headers over the socket address:
//! X-Forwarded-For (first entry), then X-Real-IP, then the connection.

use axum::extract::{ConnectInfo, Request};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::server::error::ApiError;

struct Window {
    count: u32,
    reset_at: Instant,
}

#[derive(Clone)]
pub struct RateLimiter {
    window: Duration,
    max: u32,
    hits: Arc<Mutex<HashMap<IpAddr, Window>>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max: u32) -> Self {
        Self {
            window,
            max,
            hits: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record a hit for `ip`. `Err(retry_after_secs)` when over budget.
    pub fn check(&self, ip: IpAddr, now: Instant) -> Result<(), u64> {
        let mut hits = self.hits.lock().expect("rate limiter lock poisoned");

        let window = hits.entry(ip).or_insert(Window {
            count: 0,
            reset_at: now + self.window,
        });

        if now > window.reset_at {
            window.count = 0;
            window.reset_at = now + self.window;
        }

        if window.count >= self.max {
            let retry_after = window.reset_at.saturating_duration_since(now).as_secs();
            return Err(retry_after.max(1));
        }

        window.count += 1;
        Ok(())
    }
}

/// Resolve the client address the window is keyed by.
fn client_ip(headers: &HeaderMap, socket: Option<SocketAddr>) -> Option<IpAddr> {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Some(ip) = forwarded
            .to_str()
            .ok()
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Some(ip);
        }
    }
    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Some(ip) = real_ip.to_str().ok().and_then(|s| s.parse::<IpAddr>().ok()) {
            return Some(ip);
        }
    }
    socket.map(|addr| addr.ip())
}

/// Axum middleware applying a limiter to the wrapped routes.
pub async fn rate_limit_middleware(
    limiter: RateLimiter,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(ip) = client_ip(request.headers(), connect_info.map(|ci| ci.0)) else {
        // No resolvable client address (e.g. in-process tests without
        // connect info); let the request through.
        debug!("Rate limiter skipped: no client address");
        return next.run(request).await;
    };

    match limiter.check(ip, Instant::now()) {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            debug!(%ip, retry_after, "Rate limit exceeded");
            ApiError::RateLimited { retry_after }.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn allows_up_to_max_then_rejects() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 3);
        let now = Instant::now();
        for _ in 0..3 {
            assert!(limiter.check(ip("10.0.0.1"), now).is_ok());
        }
        let retry = limiter.check(ip("10.0.0.1"), now).unwrap_err();
        assert!(retry >= 1 && retry <= 60);
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);
        let now = Instant::now();
        assert!(limiter.check(ip("10.0.0.1"), now).is_ok());
        assert!(limiter.check(ip("10.0.0.1"), now).is_err());

        let later = now + Duration::from_secs(61);
        assert!(limiter.check(ip("10.0.0.1"), later).is_ok());
    }

    #[test]
    fn addresses_are_independent() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);
        let now = Instant::now();
        assert!(limiter.check(ip("10.0.0.1"), now).is_ok());
        assert!(limiter.check(ip("10.0.0.2"), now).is_ok());
    }

    #[test]
    fn forwarded_header_wins_over_socket() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        let socket: SocketAddr = "127.0.0.1:9999".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(socket)), Some(ip("203.0.113.9")));
    }

    #[test]
    fn real_ip_header_is_second_choice() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.7"));
        assert_eq!(client_ip(&headers, None), Some(ip("198.51.100.7")));
    }

    #[test]
    fn falls_back_to_socket_address() {
        let socket: SocketAddr = "192.0.2.4:1234".parse().unwrap();
        assert_eq!(client_ip(&HeaderMap::new(), Some(socket)), Some(ip("192.0.2.4")));
        assert_eq!(client_ip(&HeaderMap::new(), None), None);
    }
}
