//! Domain Layer
//!
//! Chat entities and the traits the application layer depends on.

pub mod entity;
pub mod repository;
