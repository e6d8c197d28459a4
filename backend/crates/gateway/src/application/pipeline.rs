//! Middleware Composer
//!
//! Runs middleware strictly in order against one [`RequestContext`]. The
//! first step that responds ends the run.

use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use kernel::error::app_error::AppError;
use kernel::error::fault::Fault;

use crate::domain::context::RequestContext;
use crate::domain::middleware::{Flow, Middleware, PipelineRequest};

/// Message of the response produced when no step responds
pub const NO_HANDLER_MESSAGE: &str = "Route handler not implemented";

/// Ordered list of middleware
#[derive(Clone, Default)]
pub struct Pipeline {
    steps: Vec<Arc<dyn Middleware>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step
    pub fn with(mut self, step: impl Middleware + 'static) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    pub fn push(&mut self, step: Arc<dyn Middleware>) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step names in execution order
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    /// Run with a fresh context
    pub async fn run(&self, req: &PipelineRequest) -> Result<Response, Fault> {
        let mut ctx = RequestContext::new();
        self.execute(req, &mut ctx).await
    }

    /// Run against a caller-owned context
    ///
    /// Faults are returned as-is; rendering them is the boundary's job.
    pub async fn execute(
        &self,
        req: &PipelineRequest,
        ctx: &mut RequestContext,
    ) -> Result<Response, Fault> {
        for step in &self.steps {
            match step.call(req, ctx).await? {
                Flow::Continue => {}
                Flow::Respond(response) => {
                    tracing::trace!(step = step.name(), request_id = %ctx.request_id, "Pipeline responded");
                    return Ok(finish(response, ctx));
                }
            }
        }

        let response = AppError::not_implemented(NO_HANDLER_MESSAGE).into_response();
        Ok(finish(response, ctx))
    }
}

fn finish(mut response: Response, ctx: &RequestContext) -> Response {
    if let Some(cors) = &ctx.cors_headers {
        cors.apply(response.headers_mut());
    }
    response
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.step_names())
            .finish()
    }
}
