//! Presentation Layer
//!
//! DTOs, route handlers and the axum router.

pub mod dto;
pub mod handlers;
pub mod router;
