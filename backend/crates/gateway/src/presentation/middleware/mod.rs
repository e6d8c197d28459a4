//! Built-in middleware

pub mod auth;
pub mod cors;
pub mod logging;
pub mod methods;
pub mod rate_limit;

use async_trait::async_trait;
use kernel::error::fault::Fault;

use crate::domain::context::RequestContext;
use crate::domain::middleware::{Flow, Middleware, PipelineRequest};
use crate::domain::repository::RouteHandler;

/// Adapts a [`RouteHandler`] into the final pipeline step
pub struct HandlerStep<H> {
    handler: H,
}

impl<H> HandlerStep<H> {
    pub fn new(handler: H) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl<H> Middleware for HandlerStep<H>
where
    H: RouteHandler + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        "handler"
    }

    async fn call(&self, req: &PipelineRequest, ctx: &mut RequestContext) -> Result<Flow, Fault> {
        let response = self.handler.handle(req, ctx).await?;
        Ok(Flow::Respond(response))
    }
}
