//! Infrastructure Layer
//!
//! Database-backed rate limiting and cookie sessions.

pub mod postgres;
pub mod session;
