//! Rate limiting
//!
//! Fails open: if the store is unreachable the request proceeds and the
//! context carries no decision.

use async_trait::async_trait;
use axum::response::IntoResponse;
use kernel::error::app_error::AppError;
use kernel::error::fault::Fault;
use platform::rate_limit::{FixedWindowLimiter, RateLimitConfig, RateLimitStore};

use crate::domain::context::RequestContext;
use crate::domain::middleware::{Flow, Middleware, PipelineRequest};

pub const RATE_LIMITED_MESSAGE: &str = "Too many requests. Please try again later.";

/// `429 RATE_LIMIT_EXCEEDED` for the given policy
pub fn rate_limited(config: &RateLimitConfig) -> AppError {
    let retry_after = config.retry_after_secs();
    AppError::too_many_requests(RATE_LIMITED_MESSAGE)
        .with_retry_after(retry_after)
        .with_details(serde_json::json!({ "retryAfter": retry_after }))
}

pub struct RateLimitMiddleware<S> {
    limiter: FixedWindowLimiter<S>,
    config: RateLimitConfig,
}

impl<S> RateLimitMiddleware<S> {
    pub fn new(limiter: FixedWindowLimiter<S>, config: RateLimitConfig) -> Self {
        Self { limiter, config }
    }
}

#[async_trait]
impl<S> Middleware for RateLimitMiddleware<S>
where
    S: RateLimitStore + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    async fn call(&self, _req: &PipelineRequest, ctx: &mut RequestContext) -> Result<Flow, Fault> {
        match self.limiter.check_and_consume(&ctx.user_id, &self.config).await {
            Ok(decision) if decision.allowed => {
                ctx.rate_limit = Some(decision);
                Ok(Flow::Continue)
            }
            Ok(decision) => {
                tracing::warn!(
                    user_id = %ctx.user_id,
                    reset_at_ms = decision.reset_at_ms,
                    request_id = %ctx.request_id,
                    "Rate limit exceeded"
                );
                Ok(Flow::Respond(rate_limited(&self.config).into_response()))
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    user_id = %ctx.user_id,
                    request_id = %ctx.request_id,
                    "Rate limit check failed, allowing request"
                );
                Ok(Flow::Continue)
            }
        }
    }
}
