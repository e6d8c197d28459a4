//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Runtime configuration (environment, configured services)
//! - Cryptographic utilities (HMAC-signed tokens, Base64, random secrets)
//! - Client identification and cookie handling
//! - Fixed-window rate limiting

pub mod client;
pub mod config;
pub mod cookie;
pub mod crypto;
pub mod rate_limit;
