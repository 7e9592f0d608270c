use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use super::error::ApiError;

pub const GENERAL_MESSAGE: &str = "Too many requests from this IP, please try again later";
pub const AUTH_MESSAGE: &str = "Too many login attempts, please try again after 15 minutes";

/// Per-client limiter: `limit` requests per `window`, refilled evenly.
#[derive(Clone)]
pub struct ClientRateLimiter {
    inner: Arc<DefaultKeyedRateLimiter<String>>,
    message: &'static str,
}

impl ClientRateLimiter {
    pub fn new(limit: u32, window: Duration, message: &'static str) -> Self {
        let burst = NonZeroU32::new(limit).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(window / burst.get())
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);
        Self {
            inner: Arc::new(RateLimiter::keyed(quota)),
            message,
        }
    }

    /// `Err` carries how long the client has to wait.
    pub fn check(&self, key: &str) -> Result<(), Duration> {
        self.inner
            .check_key(&key.to_string())
            .map_err(|not_until| not_until.wait_time_from(DefaultClock::default().now()))
    }

    /// Drops keys whose quota has fully replenished.
    pub fn prune(&self) -> usize {
        self.inner.retain_recent();
        self.inner.len()
    }
}

/// Address appended by the one trusted proxy (last `X-Forwarded-For` entry),
/// else the peer address. Earlier entries are client-supplied.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit(
    State(limiter): State<ClientRateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(request.headers(), peer);
    match limiter.check(&key) {
        Ok(()) => next.run(request).await,
        Err(wait) => {
            tracing::warn!(client = %key, wait_secs = wait.as_secs(), "rate_limited");
            ApiError::new(StatusCode::TOO_MANY_REQUESTS, limiter.message)
                .with_retry_after(wait.as_secs().max(1))
                .into_response()
        }
    }
}
