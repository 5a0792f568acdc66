use chrono::{DateTime, Utc};
use reqwest::{header::HeaderMap, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Tracks GitHub rate limit headers and decides how long to back off when a
/// response was throttled
#[derive(Clone)]
pub struct RateLimiter {
    state: Arc<RwLock<RateLimitState>>,
    padding: Duration,
}

#[derive(Debug, Clone)]
struct RateLimitState {
    /// Total rate limit
    limit: u32,

    /// Remaining requests
    remaining: u32,

    /// Unix timestamp when rate limit resets
    reset_at: i64,
}

/// Rate limit headers of a single response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitHeaders {
    pub limit: Option<u32>,
    pub remaining: Option<u32>,
    pub reset: Option<i64>,
    pub retry_after: Option<u64>,
}

impl RateLimitHeaders {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            limit: header_value(headers, "x-ratelimit-limit"),
            remaining: header_value(headers, "x-ratelimit-remaining"),
            reset: header_value(headers, "x-ratelimit-reset"),
            retry_after: header_value(headers, "retry-after"),
        }
    }
}

fn header_value<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

/// Primary limits reset hourly, a longer advertised wait is not trusted
pub const MAX_BACKOFF_SECS: u64 = 3600;

/// Backoff for a throttled response, or `None` when the response is not a
/// rate limit rejection.
///
/// GitHub answers primary rate limit exhaustion with 403 and
/// `X-RateLimit-Remaining: 0`, secondary limits with 403/429 and
/// `Retry-After`. A plain 403 that still has quota left is a permission
/// problem and must not be retried.
pub fn backoff_for(
    status: StatusCode,
    headers: &RateLimitHeaders,
    now: i64,
    padding: Duration,
) -> Option<Duration> {
    if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
        return None;
    }

    let exhausted = match headers.remaining {
        Some(remaining) => remaining == 0,
        None => headers.reset.is_some(),
    };
    let throttled =
        exhausted || headers.retry_after.is_some() || status == StatusCode::TOO_MANY_REQUESTS;
    if !throttled {
        return None;
    }

    let until_reset = |reset: i64| reset.saturating_sub(now).max(0) as u64;
    let wait_secs = match (headers.reset, headers.retry_after) {
        (Some(reset), _) if exhausted => until_reset(reset),
        (_, Some(retry_after)) => retry_after,
        (Some(reset), None) => until_reset(reset),
        (None, None) => 0,
    };

    let wait = Duration::from_secs(wait_secs.min(MAX_BACKOFF_SECS));
    Some(wait.saturating_add(padding))
}

impl RateLimiter {
    /// Create a new rate limiter adding `padding` to every computed wait
    pub fn new(padding: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(RateLimitState {
                limit: 60, // Default for unauthenticated requests
                remaining: 60,
                reset_at: Utc::now().timestamp() + 3600,
            })),
            padding,
        }
    }

    /// Update rate limit from GitHub API response headers
    pub async fn update_from_headers(&self, headers: &RateLimitHeaders) {
        let mut state = self.state.write().await;

        if let Some(limit) = headers.limit {
            state.limit = limit;
        }
        if let Some(remaining) = headers.remaining {
            state.remaining = remaining;
        }
        if let Some(reset) = headers.reset {
            state.reset_at = reset;
        }

        debug!(
            "Rate limit updated: {}/{} (resets at {})",
            state.remaining, state.limit, state.reset_at
        );
    }

    /// How long to wait before retrying, if the response was throttled
    pub fn throttle_delay(
        &self,
        status: StatusCode,
        headers: &RateLimitHeaders,
    ) -> Option<Duration> {
        backoff_for(status, headers, Utc::now().timestamp(), self.padding)
    }

    /// Get current rate limit status
    pub async fn get_status(&self) -> (u32, u32, DateTime<Utc>) {
        let state = self.state.read().await;
        (
            state.remaining,
            state.limit,
            DateTime::from_timestamp(state.reset_at, 0).unwrap_or_else(Utc::now),
        )
    }
}
