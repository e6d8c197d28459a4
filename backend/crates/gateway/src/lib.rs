//! Gateway - Request pipeline for API routes
//!
//! Clean Architecture structure:
//! - `domain/` - Request context, middleware contract, collaborator traits
//! - `application/` - Middleware composer, best-effort side effects
//! - `infra/` - PostgreSQL rate-limit store, signed-cookie sessions
//! - `presentation/` - Built-in middleware, route builder, error boundary, axum adapter
//!
//! ## Request flow
//! boundary -> logging -> CORS -> method check -> auth -> rate limit -> handler
//!
//! The first step that responds ends the run. Faults travel to the boundary,
//! which renders them as error envelopes.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::effects::best_effort;
pub use application::pipeline::Pipeline;
pub use domain::context::{ANONYMOUS, RequestContext};
pub use domain::middleware::{Flow, Middleware, PipelineRequest};
pub use domain::repository::{RouteHandler, Session, SessionProvider};
pub use error::{RouteError, SessionError};
pub use infra::postgres::PgRateLimitStore;
pub use infra::session::SignedCookieSessions;
pub use presentation::middleware::cors::CorsConfig;
pub use presentation::route::{Route, RouteBuilder};
pub use presentation::router::{Endpoint, any_route};
