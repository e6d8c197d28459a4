//! Authentication

use std::sync::Arc;

use async_trait::async_trait;
use axum::response::IntoResponse;
use kernel::error::app_error::AppError;
use kernel::error::fault::Fault;
use platform::client::client_ip;

use crate::domain::context::{ANONYMOUS, RequestContext};
use crate::domain::middleware::{Flow, Middleware, PipelineRequest};
use crate::domain::repository::SessionProvider;

/// Whether a route needs a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    None,
    /// 401 without a session
    Required,
    /// Falls back to [`ANONYMOUS`]
    Optional,
}

pub struct AuthMiddleware<P> {
    provider: Arc<P>,
    mode: AuthMode,
}

impl<P> AuthMiddleware<P> {
    pub fn required(provider: Arc<P>) -> Self {
        Self {
            provider,
            mode: AuthMode::Required,
        }
    }

    pub fn optional(provider: Arc<P>) -> Self {
        Self {
            provider,
            mode: AuthMode::Optional,
        }
    }
}

#[async_trait]
impl<P> Middleware for AuthMiddleware<P>
where
    P: SessionProvider + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        match self.mode {
            AuthMode::Optional => "optional_auth",
            _ => "auth",
        }
    }

    async fn call(&self, req: &PipelineRequest, ctx: &mut RequestContext) -> Result<Flow, Fault> {
        let resolved = self.provider.resolve(req.headers()).await;

        if self.mode != AuthMode::Required {
            ctx.user_id = match resolved {
                Ok(Some(session)) => session.user_id,
                Ok(None) => ANONYMOUS.to_string(),
                Err(e) => {
                    tracing::debug!(error = %e, "Optional session lookup failed");
                    ANONYMOUS.to_string()
                }
            };
            return Ok(Flow::Continue);
        }

        match resolved {
            Ok(Some(session)) => {
                ctx.user_id = session.user_id;
                Ok(Flow::Continue)
            }
            Ok(None) => {
                tracing::warn!(
                    path = req.path(),
                    ip = %client_ip(req.headers()),
                    request_id = %ctx.request_id,
                    "Unauthorized access attempt"
                );
                Ok(Flow::Respond(
                    AppError::unauthorized("Authentication required").into_response(),
                ))
            }
            Err(e) => {
                tracing::error!(error = %e, request_id = %ctx.request_id, "Authentication error");
                Ok(Flow::Respond(
                    AppError::unauthorized("Authentication failed").into_response(),
                ))
            }
        }
    }
}
