//! Gateway Error Types

use thiserror::Error;

/// Failure while resolving a session
///
/// A missing or forged token is not an error; providers report those as
/// "no session".
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session store error: {0}")]
    Store(String),

    #[error("session provider misconfigured: {0}")]
    Configuration(String),
}

/// Failure while assembling a route
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid CORS origin: {0:?}")]
    InvalidOrigin(String),
}
