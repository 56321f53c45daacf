//! Per-route, per-client request limits.
//!
//! Each (method, route, client ip) key gets a fixed one-minute window with a
//! request counter. Writes on most routes share the standard limit, signin
//! has its own stricter limit, reads and signup are not limited.
//!
//! Only requests that reach the endpoint are counted. A request turned away
//! by authentication or validation is admitted against the window and then
//! refunded.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, MatchedPath, Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;

use super::RejectedRequest;
use crate::config::RateLimitConfig;
use crate::error::AppError;
use crate::state::AppState;

const WINDOW: Duration = Duration::from_secs(60);
const FORWARDED_FOR: &str = "x-forwarded-for";

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window counters keyed by caller and route.
#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    window: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_window(WINDOW)
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            window,
        }
    }

    /// Counts one request against `key`.
    ///
    /// Returns the start of the window it was counted in, or
    /// `Err(retry_after_secs)` once `limit` requests were already seen in the
    /// current window.
    pub fn check(&self, key: &str, limit: u32) -> Result<Instant, u64> {
        let now = Instant::now();
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= limit {
            let remaining = self.window.saturating_sub(now.duration_since(entry.started));
            let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
            return Err(secs.max(1));
        }

        entry.count += 1;
        Ok(entry.started)
    }

    /// Takes back a request counted by [`RateLimiter::check`], unless its
    /// window has rolled over since.
    pub fn refund(&self, key: &str, window_start: Instant) {
        if let Some(mut entry) = self.windows.get_mut(key)
            && entry.started == window_start
        {
            entry.count = entry.count.saturating_sub(1);
        }
    }

    /// Drops windows that have already ended
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.windows
            .retain(|_, w| now.duration_since(w.started) < self.window);
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

/// Requests per minute allowed for a route, `None` when unlimited.
pub fn policy(method: &Method, route: &str, config: &RateLimitConfig) -> Option<u32> {
    if matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS) {
        return None;
    }

    if *method == Method::POST && route.ends_with("/users/signin") {
        return Some(config.auth_requests_per_minute);
    }
    if *method == Method::POST && route.ends_with("/users/signup") {
        return None;
    }

    Some(config.requests_per_minute)
}

/// Peer address, then the first `X-Forwarded-For` hop, then `unknown`.
pub fn client_ip(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    request
        .headers()
        .get(FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let config = &state.rate_limit;
    if !config.enabled {
        return Ok(next.run(request).await);
    }

    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let Some(limit) = policy(request.method(), &route, config) else {
        return Ok(next.run(request).await);
    };

    let ip = client_ip(&request);
    let key = format!("{} {} {}", request.method(), route, ip);

    let window_start = match state.rate_limiter.check(&key, limit) {
        Ok(started) => started,
        Err(retry_after) => {
            tracing::warn!(%ip, %route, limit, retry_after, "Rate limit exceeded");
            return Err(AppError::TooManyRequests { limit, retry_after });
        }
    };

    let response = next.run(request).await;
    if response.extensions().get::<RejectedRequest>().is_some() {
        state.rate_limiter.refund(&key, window_start);
    }

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Router, middleware};
    use tower::ServiceExt;

    use crate::config::Settings;
    use crate::db::lazy_connection_pool;

    fn config() -> RateLimitConfig {
        RateLimitConfig {
            enabled: true,
            requests_per_minute: 10,
            auth_requests_per_minute: 5,
        }
    }

    #[test]
    fn test_limit_then_reject() {
        let limiter = RateLimiter::new();

        for _ in 0..3 {
            assert!(limiter.check("k", 3).is_ok());
        }
        let retry_after = limiter.check("k", 3).unwrap_err();
        assert!((1..=60).contains(&retry_after));

        // Other keys are independent
        assert!(limiter.check("other", 3).is_ok());
    }

    #[test]
    fn test_refund_returns_quota() {
        let limiter = RateLimiter::new();

        let started = limiter.check("k", 1).unwrap();
        assert!(limiter.check("k", 1).is_err());

        limiter.refund("k", started);
        assert!(limiter.check("k", 1).is_ok());

        // Unknown keys are ignored
        limiter.refund("missing", started);
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[tokio::test]
    async fn test_refund_ignores_rolled_over_window() {
        let limiter = RateLimiter::with_window(Duration::from_millis(30));
        let stale = limiter.check("k", 1).unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(limiter.check("k", 1).is_ok());

        limiter.refund("k", stale);
        assert!(limiter.check("k", 1).is_err());
    }

    /// Signin stand-in: rejects like the auth layer when told to, otherwise
    /// answers like the endpoint would.
    async fn signin(headers: HeaderMap) -> Result<&'static str, AppError> {
        match headers.get("x-outcome").and_then(|v| v.to_str().ok()) {
            Some("unauthorized") => Err(AppError::unauthorized("Invalid or expired token")),
            Some("invalid") => Err(AppError::InvalidRequest {
                message: "Failed to parse the request body".to_string(),
            }),
            Some("credentials") => Err(AppError::BadRequest {
                message: "Invalid credentials".to_string(),
            }),
            _ => Ok("token"),
        }
    }

    fn limited_app() -> Router {
        let mut settings = Settings::default();
        settings.database.url = "postgres://nobody@127.0.0.1:1/none".to_string();
        settings.database.min_connections = 0;
        let state = AppState::new(lazy_connection_pool(&settings.database), &settings);

        Router::new()
            .route("/api/v1/users/signin", post(signin))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                rate_limit_middleware,
            ))
            .with_state(state)
    }

    fn signin_request(outcome: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/api/v1/users/signin")
            .header(FORWARDED_FOR, "198.51.100.4")
            .header("x-outcome", outcome)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_rejected_requests_do_not_use_quota() {
        let app = limited_app();
        let limit = Settings::default().rate_limit.auth_requests_per_minute;

        for outcome in ["unauthorized", "invalid"] {
            for _ in 0..=limit {
                let response = app.clone().oneshot(signin_request(outcome)).await.unwrap();
                assert_ne!(response.status(), StatusCode::TOO_MANY_REQUESTS);
            }
        }

        for _ in 0..limit {
            let response = app.clone().oneshot(signin_request("ok")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        let response = app.clone().oneshot(signin_request("ok")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_endpoint_failures_use_quota() {
        let app = limited_app();
        let limit = Settings::default().rate_limit.auth_requests_per_minute;

        for _ in 0..limit {
            let response = app
                .clone()
                .oneshot(signin_request("credentials"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        let response = app.clone().oneshot(signin_request("ok")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key("retry-after"));
    }

    #[tokio::test]
    async fn test_window_resets() {
        let limiter = RateLimiter::with_window(Duration::from_millis(50));

        assert!(limiter.check("k", 1).is_ok());
        assert!(limiter.check("k", 1).is_err());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(limiter.check("k", 1).is_ok());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let limiter = RateLimiter::with_window(Duration::from_millis(20));
        limiter.check("a", 1).unwrap();
        limiter.check("b", 1).unwrap();
        assert_eq!(limiter.tracked_keys(), 2);

        tokio::time::sleep(Duration::from_millis(40)).await;
        limiter.purge_expired();
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[test]
    fn test_policy() {
        let cfg = config();

        assert_eq!(policy(&Method::POST, "/api/v1/users/signin", &cfg), Some(5));
        assert_eq!(policy(&Method::POST, "/api/v1/users/signup", &cfg), None);
        assert_eq!(policy(&Method::GET, "/api/v1/products", &cfg), None);
        assert_eq!(policy(&Method::PUT, "/api/v1/users/update", &cfg), Some(10));
        assert_eq!(policy(&Method::DELETE, "/api/v1/categories/{id}", &cfg), Some(10));
        assert_eq!(policy(&Method::PATCH, "/api/v1/products/{id}", &cfg), Some(10));
    }

    #[test]
    fn test_client_ip_sources() {
        let mut request = Request::builder()
            .header(FORWARDED_FOR, "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&request), "203.0.113.7");

        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));
        assert_eq!(client_ip(&request), "192.0.2.1");

        let bare = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_ip(&bare), "unknown");
    }
}
