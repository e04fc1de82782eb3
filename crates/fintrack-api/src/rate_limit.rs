//! Fixed-window request limiting for chart-generating routes

use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use fintrack_config::RateLimitConfig;

use crate::{ApiError, AppState};

/// At most `limit` requests per `window`, shared by every client
#[derive(Debug)]
pub struct FixedWindow {
    limit: u32,
    window: Duration,
    state: Mutex<(Instant, u32)>,
}

impl FixedWindow {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self::starting_at(limit, window, Instant::now())
    }

    /// A limiter whose first window opens at `start`
    pub fn starting_at(limit: u32, window: Duration, start: Instant) -> Self {
        Self {
            limit,
            window,
            state: Mutex::new((start, 0)),
        }
    }

    /// `None` when limiting is disabled
    pub fn from_config(config: &RateLimitConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(config.requests, Duration::from_secs(config.per_seconds)))
    }

    /// Count a request at `now`.
    ///
    /// On rejection returns the seconds until the window resets, rounded up
    /// so a client waiting that long is never rejected again by the same window.
    pub fn check_at(&self, now: Instant) -> Result<(), u64> {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let (started, count) = &mut *guard;

        if now.duration_since(*started) >= self.window {
            *started = now;
            *count = 0;
        }
        if *count >= self.limit {
            let remaining = self.window.saturating_sub(now.duration_since(*started));
            let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
            return Err(secs.max(1));
        }
        *count += 1;
        Ok(())
    }

    pub fn check(&self) -> Result<(), u64> {
        self.check_at(Instant::now())
    }
}

pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(limiter) = &state.limiter {
        if let Err(retry_after_secs) = limiter.check() {
            log::warn!("Rate limit exceeded for {}", request.uri().path());
            return Err(ApiError::TooManyRequests { retry_after_secs });
        }
    }
    Ok(next.run(request).await)
}
