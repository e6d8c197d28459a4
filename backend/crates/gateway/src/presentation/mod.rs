//! Presentation Layer
//!
//! Built-in middleware, route assembly, the error boundary and the axum
//! adapter.

pub mod boundary;
pub mod middleware;
pub mod route;
pub mod router;
