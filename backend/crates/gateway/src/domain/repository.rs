//! Collaborator Traits
//!
//! Interfaces the pipeline depends on. Implementations live in `infra/` or in
//! the crates that own the routes.

use axum::http::HeaderMap;
use axum::response::Response;
use kernel::error::fault::Fault;

use crate::domain::context::RequestContext;
use crate::domain::middleware::PipelineRequest;
use crate::error::SessionError;

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

/// Resolves the caller's session from request headers
#[trait_variant::make(SessionProvider: Send)]
pub trait LocalSessionProvider {
    /// `Ok(None)` when no valid session is present
    async fn resolve(&self, headers: &HeaderMap) -> Result<Option<Session>, SessionError>;
}

/// Final step of a route: produces the response
#[trait_variant::make(RouteHandler: Send)]
pub trait LocalRouteHandler {
    async fn handle(&self, req: &PipelineRequest, ctx: &RequestContext) -> Result<Response, Fault>;
}
