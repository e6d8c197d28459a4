//! Request logging

use async_trait::async_trait;
use kernel::error::fault::Fault;
use platform::client::{client_ip, user_agent};

use crate::domain::context::RequestContext;
use crate::domain::middleware::{Flow, Middleware, PipelineRequest};

/// Logs every incoming request at info; never responds
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingMiddleware;

#[async_trait]
impl Middleware for LoggingMiddleware {
    fn name(&self) -> &'static str {
        "logging"
    }

    async fn call(&self, req: &PipelineRequest, ctx: &mut RequestContext) -> Result<Flow, Fault> {
        tracing::info!(
            method = %req.method(),
            path = req.path(),
            user_id = %ctx.user_id,
            ip = %client_ip(req.headers()),
            user_agent = %user_agent(req.headers()),
            request_id = %ctx.request_id,
            "API request"
        );
        Ok(Flow::Continue)
    }
}
