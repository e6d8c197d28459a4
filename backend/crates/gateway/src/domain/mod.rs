//! Domain Layer
//!
//! Request context, the middleware contract, and collaborator traits.

pub mod context;
pub mod middleware;
pub mod repository;
