use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::net::SocketAddr;
use tracing::warn;

use crate::state::AppState;
use crate::utils::error::ApiError;

/// Per-client sliding-window admission control.
///
/// Each client key owns a timestamp deque; entries older than the window are
/// pruned lazily on that client's own calls, so the residue per key is
/// bounded by the cap.
pub struct RateLimiter {
    window: Duration,
    cap: usize,
    hits: DashMap<String, VecDeque<DateTime<Utc>>>,
}

impl RateLimiter {
    pub fn new(window_seconds: i64, cap: usize) -> Self {
        Self {
            window: Duration::seconds(window_seconds),
            cap,
            hits: DashMap::new(),
        }
    }

    /// Admit or reject one request for `client_key` at `now`. A rejected
    /// request is not recorded against the window.
    pub fn check(&self, client_key: &str, now: DateTime<Utc>) -> bool {
        let mut stamps = self.hits.entry(client_key.to_string()).or_default();

        let cutoff = now - self.window;
        while stamps.front().is_some_and(|t| *t <= cutoff) {
            stamps.pop_front();
        }

        if stamps.len() >= self.cap {
            return false;
        }
        stamps.push_back(now);
        true
    }
}

/// Gate every request on the caller's network address before it reaches
/// session logic.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client_key = addr.ip().to_string();
    if !state.rate_limiter.check(&client_key, Utc::now()) {
        warn!("Rate limit exceeded for client {}", client_key);
        return Err(ApiError::RateLimited(
            "Please wait before making more requests".to_string(),
        ));
    }
    Ok(next.run(request).await)
}
