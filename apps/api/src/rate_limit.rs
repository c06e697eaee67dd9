//! Fixed-window request limiting keyed by client IP.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

/// Windows are swept once the map grows past this many clients.
const SWEEP_THRESHOLD: usize = 10_000;

struct Window {
    started: Instant,
    count: u32,
}

pub struct RateLimiter {
    limit: u32,
    window: Duration,
    clients: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    /// Counts one request for `client`; false once its window is used up.
    pub fn check(&self, client: &str) -> bool {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: &str, now: Instant) -> bool {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);

        if clients.len() > SWEEP_THRESHOLD {
            clients.retain(|_, w| now.saturating_duration_since(w.started) < self.window);
        }

        let window = clients.entry(client.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.saturating_duration_since(window.started) >= self.window {
            window.started = now;
            window.count = 0;
        }
        if window.count >= self.limit {
            return false;
        }
        window.count += 1;
        true
    }
}

/// Middleware applying `AppState::root_limiter`.
pub async fn limit_by_client_ip(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client = client_key(&request);
    if !state.root_limiter.check(&client) {
        warn!("Rate limit exceeded for {client}");
        return Err(AppError::RateLimited);
    }
    Ok(next.run(request).await)
}

/// First `X-Forwarded-For` hop, else the peer address, else a shared bucket.
fn client_key(request: &Request) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_allows_up_to_limit_then_rejects() {
        let limiter = RateLimiter::per_minute(3);
        let t0 = Instant::now();
        assert!(limiter.check_at("1.2.3.4", t0));
        assert!(limiter.check_at("1.2.3.4", t0));
        assert!(limiter.check_at("1.2.3.4", t0));
        assert!(!limiter.check_at("1.2.3.4", t0 + Duration::from_secs(59)));
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::per_minute(1);
        let t0 = Instant::now();
        assert!(limiter.check_at("1.2.3.4", t0));
        assert!(!limiter.check_at("1.2.3.4", t0 + Duration::from_secs(30)));
        assert!(limiter.check_at("1.2.3.4", t0 + Duration::from_secs(60)));
    }

    #[test]
    fn test_clients_are_counted_separately() {
        let limiter = RateLimiter::per_minute(1);
        let t0 = Instant::now();
        assert!(limiter.check_at("1.2.3.4", t0));
        assert!(limiter.check_at("5.6.7.8", t0));
        assert!(!limiter.check_at("1.2.3.4", t0));
    }

    #[test]
    fn test_client_key_prefers_forwarded_for() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_key(&request), "203.0.113.7");
    }

    #[test]
    fn test_client_key_uses_peer_address() {
        let mut request = Request::builder().body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([198, 51, 100, 2], 4000))));
        assert_eq!(client_key(&request), "198.51.100.2");

        let bare = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_key(&bare), "unknown");
    }
}
