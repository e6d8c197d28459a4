//! Request Context
//!
//! Per-request state shared by the middleware of one pipeline run.

use std::time::Instant;

use axum::http::{HeaderMap, HeaderValue, header};
use kernel::id::RequestId;
use platform::rate_limit::RateLimitDecision;

/// `user_id` of callers without a session
pub const ANONYMOUS: &str = "anonymous";

/// CORS headers recorded by the CORS step, copied onto the final response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsHeaders {
    pub allow_origin: HeaderValue,
    pub allow_methods: HeaderValue,
    pub allow_headers: HeaderValue,
}

impl CorsHeaders {
    /// Insert into `headers` without overwriting values a handler already set
    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, &self.allow_origin),
            (header::ACCESS_CONTROL_ALLOW_METHODS, &self.allow_methods),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, &self.allow_headers),
        ] {
            headers.entry(name).or_insert_with(|| value.clone());
        }
    }
}

/// Mutable state for one request
///
/// Created fresh for every pipeline run and dropped with it. Middleware
/// communicate only through these fields.
#[derive(Debug)]
pub struct RequestContext {
    pub request_id: RequestId,
    /// [`ANONYMOUS`] until an auth step resolves a session
    pub user_id: String,
    pub start_time: Instant,
    /// Set by the rate-limit step when the request was allowed
    pub rate_limit: Option<RateLimitDecision>,
    pub cors_headers: Option<CorsHeaders>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: RequestId::new(),
            user_id: ANONYMOUS.to_string(),
            start_time: Instant::now(),
            rate_limit: None,
            cors_headers: None,
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}
