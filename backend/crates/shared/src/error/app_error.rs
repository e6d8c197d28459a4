//! Application Error - a fault already classified for the client
//!
//! An [`AppError`] knows its row in the code table and renders directly into
//! the error envelope. Handlers rarely build one: they return a
//! [`Fault`](super::fault::Fault) and let the boundary classify it.

use std::borrow::Cow;
use std::fmt;

use super::kind::ErrorKind;

/// Client-facing error
///
/// ```rust
/// use kernel::error::{app_error::AppError, kind::ErrorKind};
///
/// let err = AppError::too_many_requests("Slow down").with_retry_after(900);
/// assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
/// assert_eq!(err.status_code(), 429);
/// assert_eq!(err.retry_after_secs(), Some(900));
/// ```
#[derive(Debug, Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: Cow<'static, str>,
    /// Rendered as `error.details`
    details: Option<serde_json::Value>,
    /// Rendered as `Retry-After` for the kinds that carry one
    retry_after_secs: Option<u64>,
}

/// `Result<T, AppError>`
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
            retry_after_secs: None,
        }
    }

    /// Error carrying the kind's default message
    pub fn from_kind(kind: ErrorKind) -> Self {
        Self::new(kind, kind.default_message())
    }

    // Terminal responses built by the pipeline's own steps

    pub fn unauthorized(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn method_not_allowed(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::MethodNotAllowed, message)
    }

    pub fn too_many_requests(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::RateLimitExceeded, message)
    }

    pub fn not_implemented(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::NotImplemented, message)
    }

    pub fn gateway_timeout(message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ErrorKind::GatewayTimeout, message)
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Retry hint in seconds
    ///
    /// Only kinds that [support it](ErrorKind::supports_retry_after) emit the
    /// header.
    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after_secs = Some(seconds);
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&serde_json::Value> {
        self.details.as_ref()
    }

    pub fn retry_after_secs(&self) -> Option<u64> {
        self.retry_after_secs
    }
}

impl From<ErrorKind> for AppError {
    fn from(kind: ErrorKind) -> Self {
        AppError::from_kind(kind)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_default_message() {
        for kind in ErrorKind::ALL {
            let err = AppError::from(kind);
            assert_eq!(err.message(), kind.default_message());
            assert_eq!(err.code(), kind.code());
            assert_eq!(err.status_code(), kind.status_code());
        }
    }

    #[test]
    fn test_pipeline_constructors() {
        assert_eq!(AppError::unauthorized("x").status_code(), 401);
        assert_eq!(AppError::method_not_allowed("x").status_code(), 405);
        assert_eq!(AppError::too_many_requests("x").status_code(), 429);
        assert_eq!(AppError::not_implemented("x").status_code(), 501);
        assert_eq!(AppError::gateway_timeout("x").status_code(), 504);
    }

    #[test]
    fn test_details_and_retry_hint() {
        let err = AppError::new(ErrorKind::ValidationError, "Validation failed")
            .with_details(serde_json::json!({ "errors": [] }))
            .with_retry_after(30);
        assert_eq!(err.details().unwrap()["errors"], serde_json::json!([]));
        assert_eq!(err.retry_after_secs(), Some(30));
    }

    #[test]
    fn test_display() {
        let err = AppError::unauthorized("Authentication required");
        assert_eq!(err.to_string(), "[UNAUTHORIZED] Authentication required");
    }
}
