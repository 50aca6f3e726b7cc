//! Rate limiting middleware
//!
//! Implements per-key fixed-window rate limiting in process memory.
//! The check is synchronous end to end (no await between reading and
//! updating a window), so per-key updates are atomic within one process.
//! Multi-process deployments would need an external shared counter.

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::config::LimitSettings;
use crate::middleware::auth::AuthenticatedUser;
use crate::routes::metrics::record_rate_limit;

/// What a limiter keys its windows on
///
/// One consistent policy per limiter purpose: user-scoped limiters key
/// on the authenticated identity (falling back to the client address
/// for anonymous callers), network-scoped limiters key on the client
/// address only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyScope {
    /// Authenticated user id, client address when anonymous
    User,
    /// Client network address
    Address,
}

/// Rate limit configuration for one named limiter
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Limiter name for logging and metrics
    pub name: &'static str,
    /// Maximum requests per window
    pub max_requests: u32,
    /// Window length
    pub window: Duration,
    /// Key derivation policy
    pub scope: KeyScope,
}

impl RateLimitConfig {
    pub fn new(name: &'static str, settings: LimitSettings, scope: KeyScope) -> Self {
        Self {
            name,
            max_requests: settings.max_requests,
            window: settings.window,
            scope,
        }
    }
}

/// One fixed window of requests for a key
struct Window {
    count: u32,
    reset_at: Instant,
}

/// Rate limit check result
///
/// Rejection is data, never an error: a rejected check still carries
/// everything needed to build a 429 with standard rate-limit headers.
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    /// Whether the request is allowed
    pub allowed: bool,
    /// Maximum requests allowed in window
    pub limit: u32,
    /// Remaining requests in current window (never negative)
    pub remaining: u32,
    /// Time until the current window resets
    pub reset_in: Duration,
    /// Seconds to wait before retrying; set only when rejected
    pub retry_after: Option<u64>,
}

impl RateLimitResult {
    /// Create rate limit headers for the response
    ///
    /// `X-RateLimit-Reset` is an epoch timestamp, derived from the wall
    /// clock at response time.
    pub fn headers(&self) -> Vec<(header::HeaderName, HeaderValue)> {
        let reset_at = chrono::Utc::now().timestamp() + self.reset_in.as_secs() as i64;

        let mut headers = vec![
            (
                header::HeaderName::from_static("x-ratelimit-limit"),
                HeaderValue::from_str(&self.limit.to_string()).unwrap(),
            ),
            (
                header::HeaderName::from_static("x-ratelimit-remaining"),
                HeaderValue::from_str(&self.remaining.to_string()).unwrap(),
            ),
            (
                header::HeaderName::from_static("x-ratelimit-reset"),
                HeaderValue::from_str(&reset_at.to_string()).unwrap(),
            ),
        ];

        if let Some(retry_after) = self.retry_after {
            headers.push((
                header::RETRY_AFTER,
                HeaderValue::from_str(&retry_after.to_string()).unwrap(),
            ));
        }

        headers
    }
}

/// Per-key fixed-window request counter
///
/// Windows are created lazily on first request per key and reset in
/// place once their deadline passes. Stale windows are dropped by the
/// background sweeper.
pub struct FixedWindowLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, Window>>,
    clock: Arc<dyn Clock>,
}

impl FixedWindowLimiter {
    /// Create a limiter with the system clock
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a limiter reading time from the given clock
    pub fn with_clock(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
            clock,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Count a request against `key` and report whether it is allowed
    pub fn check(&self, key: &str) -> RateLimitResult {
        let now = self.clock.now();
        let mut windows = self.windows.lock().unwrap();

        let window = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            reset_at: now + self.config.window,
        });

        if window.reset_at <= now {
            // Window elapsed: start a fresh one.
            window.count = 1;
            window.reset_at = now + self.config.window;
        } else {
            window.count += 1;
        }

        let allowed = window.count <= self.config.max_requests;
        let remaining = self.config.max_requests.saturating_sub(window.count);
        let reset_in = window.reset_at.saturating_duration_since(now);

        let retry_after = if allowed {
            None
        } else {
            Some(ceil_seconds(reset_in))
        };

        record_rate_limit(self.config.name, allowed);

        RateLimitResult {
            allowed,
            limit: self.config.max_requests,
            remaining,
            reset_in,
            retry_after,
        }
    }

    /// Drop windows whose deadline has passed; returns how many
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut windows = self.windows.lock().unwrap();
        let before = windows.len();
        windows.retain(|_, window| window.reset_at > now);
        before - windows.len()
    }

    /// Number of live windows, for tests and diagnostics
    pub fn window_count(&self) -> usize {
        self.windows.lock().unwrap().len()
    }
}

/// Round a duration up to whole seconds, with a floor of one
fn ceil_seconds(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs.max(1)
    }
}

/// Rejection body sent with 429 responses
#[derive(Debug, Serialize)]
struct RateLimitedBody {
    error: &'static str,
    message: String,
    #[serde(rename = "retryAfter")]
    retry_after: u64,
}

/// Build a 429 Too Many Requests response with rate limit headers
pub fn rate_limited_response(config: &RateLimitConfig, result: &RateLimitResult) -> Response {
    let retry_after = result.retry_after.unwrap_or(1);

    let body = RateLimitedBody {
        error: "Rate limit exceeded",
        message: format!(
            "Too many {} requests. Try again in {} seconds.",
            config.name, retry_after
        ),
        retry_after,
    };

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();

    let headers = response.headers_mut();
    for (name, value) in result.headers() {
        headers.insert(name, value);
    }

    response
}

/// Derive the limiter key for a request according to the limiter's scope
pub fn derive_key(scope: KeyScope, request: &Request) -> String {
    match scope {
        KeyScope::User => request
            .extensions()
            .get::<AuthenticatedUser>()
            .map(|user| user.user_id.clone())
            .unwrap_or_else(|| client_addr(request)),
        KeyScope::Address => client_addr(request),
    }
}

/// Best-effort client network address
///
/// Prefers the first `X-Forwarded-For` hop (the service runs behind a
/// proxy in production), then the socket peer address.
pub fn client_addr(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Create a rate limiting middleware layer bound to one limiter instance
///
/// Checks the limit before the handler runs; rejected requests get a 429
/// with retry metadata, allowed ones get rate-limit headers appended to
/// the handler's response.
pub fn rate_limit_layer(
    limiter: Arc<FixedWindowLimiter>,
) -> impl Fn(Request, Next) -> Pin<Box<dyn Future<Output = Response> + Send>> + Clone + Send + 'static
{
    move |request: Request, next: Next| {
        let limiter = limiter.clone();
        Box::pin(async move {
            let key = derive_key(limiter.config().scope, &request);
            let result = limiter.check(&key);

            if !result.allowed {
                tracing::warn!(
                    limiter = limiter.config().name,
                    key = %key,
                    limit = result.limit,
                    "Rate limit exceeded"
                );
                return rate_limited_response(limiter.config(), &result);
            }

            let mut response = next.run(request).await;

            let headers = response.headers_mut();
            for (name, value) in result.headers() {
                headers.insert(name, value);
            }

            response
        })
    }
}
