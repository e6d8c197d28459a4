//! Fault - Unclassified failures raised by handlers and collaborators
//!
//! A [`Fault`] is what code below the HTTP boundary returns. It is tagged at
//! the point of failure, so the boundary never inspects message text: the
//! conversion into [`AppError`] is one exhaustive match.

use std::backtrace::Backtrace;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::app_error::AppError;
use super::kind::ErrorKind;

/// External service a [`Fault::Dependency`] originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dependency {
    Database,
    Ai,
    Ledger,
    Blob,
}

impl Dependency {
    /// Human label used in client-facing messages
    pub const fn label(&self) -> &'static str {
        match self {
            Dependency::Database => "Database",
            Dependency::Ai => "AI service",
            Dependency::Ledger => "Ledger service",
            Dependency::Blob => "Blob storage",
        }
    }

    /// Code reported when the service fails without a more specific cause
    pub const fn failure_kind(&self) -> ErrorKind {
        match self {
            Dependency::Database => ErrorKind::DatabaseError,
            Dependency::Ai => ErrorKind::AiServiceError,
            Dependency::Ledger => ErrorKind::BlockchainError,
            Dependency::Blob => ErrorKind::InternalError,
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Dependency::Database => "database",
            Dependency::Ai => "ai",
            Dependency::Ledger => "ledger",
            Dependency::Blob => "blob",
        })
    }
}

/// Why a dependency call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cause {
    /// Provider quota exhausted
    Quota,
    /// Credentials missing or refused
    Auth,
    Timeout,
    /// Connection refused, pool exhausted, provider down
    Unavailable,
    /// Provider refused the content (safety filters, invalid input)
    Rejected,
    Failed,
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Cause::Quota => "quota exceeded",
            Cause::Auth => "authentication failed",
            Cause::Timeout => "timed out",
            Cause::Unavailable => "unavailable",
            Cause::Rejected => "rejected",
            Cause::Failed => "failed",
        })
    }
}

/// One failed input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure taxonomy
#[derive(Debug, Error)]
pub enum Fault {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("validation failed: {message}")]
    Validation {
        message: String,
        errors: Vec<FieldError>,
    },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after_secs: Option<u64>,
    },

    /// `detail` is the raw provider text; it is logged, never rendered
    #[error("{service} {cause}: {detail}")]
    Dependency {
        service: Dependency,
        cause: Cause,
        detail: String,
    },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("internal error: {message}")]
    Internal { message: String, stack: String },
}

impl Fault {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Fault::BadRequest(message.into())
    }

    pub fn validation(message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Fault::Validation {
            message: message.into(),
            errors,
        }
    }

    pub fn dependency(service: Dependency, cause: Cause, detail: impl fmt::Display) -> Self {
        Fault::Dependency {
            service,
            cause,
            detail: detail.to_string(),
        }
    }

    /// Unexpected failure; captures the current backtrace
    ///
    /// Captured regardless of `RUST_BACKTRACE`. Only a disclosing boundary
    /// renders it.
    pub fn internal(message: impl Into<String>) -> Self {
        Fault::Internal {
            message: message.into(),
            stack: Backtrace::force_capture().to_string(),
        }
    }

    /// Code this fault renders as
    pub fn kind(&self) -> ErrorKind {
        match self {
            Fault::BadRequest(_) => ErrorKind::BadRequest,
            Fault::Validation { .. } => ErrorKind::ValidationError,
            Fault::Unauthorized(_) => ErrorKind::Unauthorized,
            Fault::Forbidden(_) => ErrorKind::Forbidden,
            Fault::NotFound(_) => ErrorKind::NotFound,
            Fault::RateLimited { .. } => ErrorKind::RateLimitExceeded,
            Fault::Dependency { service, cause, .. } => match cause {
                Cause::Quota | Cause::Unavailable => ErrorKind::ServiceUnavailable,
                Cause::Auth => ErrorKind::Unauthorized,
                Cause::Timeout => ErrorKind::GatewayTimeout,
                Cause::Rejected => ErrorKind::BadRequest,
                Cause::Failed => service.failure_kind(),
            },
            Fault::Configuration(_) => ErrorKind::ConfigurationError,
            Fault::Internal { .. } => ErrorKind::InternalError,
        }
    }

    /// Classify for the client
    ///
    /// With `disclose` unset, an internal fault collapses to a generic
    /// message with no details. Dependency detail is never rendered either way.
    pub fn into_app_error(self, disclose: bool) -> AppError {
        let kind = self.kind();
        match self {
            Fault::BadRequest(message)
            | Fault::Unauthorized(message)
            | Fault::Forbidden(message)
            | Fault::NotFound(message) => AppError::new(kind, message),
            Fault::Validation { message, errors } => {
                AppError::new(kind, message).with_details(serde_json::json!({ "errors": errors }))
            }
            Fault::RateLimited {
                message,
                retry_after_secs,
            } => {
                let err = AppError::new(kind, message);
                match retry_after_secs {
                    Some(secs) => err
                        .with_retry_after(secs)
                        .with_details(serde_json::json!({ "retryAfter": secs })),
                    None => err,
                }
            }
            Fault::Dependency { service, cause, .. } => {
                AppError::new(kind, dependency_message(service, cause))
            }
            Fault::Configuration(_) => AppError::from_kind(kind),
            Fault::Internal { message, stack } => {
                if disclose {
                    AppError::new(kind, message).with_details(serde_json::json!({ "stack": stack }))
                } else {
                    AppError::new(kind, "An error occurred")
                }
            }
        }
    }
}

fn dependency_message(service: Dependency, cause: Cause) -> String {
    match (service, cause) {
        (Dependency::Ai, Cause::Quota) => "API quota exceeded. Please try again later.".to_owned(),
        (Dependency::Ai, Cause::Rejected) => {
            "Response blocked by safety filters. Please rephrase your query.".to_owned()
        }
        (_, Cause::Quota) => format!("{} quota exceeded. Please try again later.", service.label()),
        (_, Cause::Rejected) => format!("{} rejected the request", service.label()),
        (_, Cause::Auth) => format!("{} authentication failed", service.label()),
        (_, Cause::Timeout) => format!("{} timed out", service.label()),
        (_, Cause::Unavailable) => format!("{} temporarily unavailable", service.label()),
        (_, Cause::Failed) => service.failure_kind().default_message().to_owned(),
    }
}

impl From<Fault> for AppError {
    /// Full disclosure. The HTTP boundary decides disclosure itself.
    fn from(fault: Fault) -> Self {
        fault.into_app_error(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependency_cause_mapping() {
        let cases = [
            (Dependency::Ai, Cause::Quota, ErrorKind::ServiceUnavailable),
            (Dependency::Database, Cause::Unavailable, ErrorKind::ServiceUnavailable),
            (Dependency::Ai, Cause::Auth, ErrorKind::Unauthorized),
            (Dependency::Ledger, Cause::Timeout, ErrorKind::GatewayTimeout),
            (Dependency::Ai, Cause::Rejected, ErrorKind::BadRequest),
            (Dependency::Database, Cause::Failed, ErrorKind::DatabaseError),
            (Dependency::Ai, Cause::Failed, ErrorKind::AiServiceError),
            (Dependency::Ledger, Cause::Failed, ErrorKind::BlockchainError),
            (Dependency::Blob, Cause::Failed, ErrorKind::InternalError),
        ];

        for (service, cause, expected) in cases {
            let fault = Fault::dependency(service, cause, "raw");
            assert_eq!(fault.kind(), expected, "{service} {cause}");
        }
    }

    #[test]
    fn test_dependency_detail_is_not_rendered() {
        let fault = Fault::dependency(
            Dependency::Database,
            Cause::Failed,
            "password authentication failed for user \"postgres\"",
        );
        let err = fault.into_app_error(true);
        assert_eq!(err.code(), "DATABASE_ERROR");
        assert_eq!(err.message(), "Database operation failed");
        assert!(err.details().is_none());
    }

    #[test]
    fn test_ai_messages() {
        let quota = Fault::dependency(Dependency::Ai, Cause::Quota, "429").into_app_error(false);
        assert_eq!(quota.status_code(), 503);
        assert_eq!(quota.message(), "API quota exceeded. Please try again later.");

        let safety = Fault::dependency(Dependency::Ai, Cause::Rejected, "SAFETY").into_app_error(false);
        assert_eq!(safety.status_code(), 400);
    }

    #[test]
    fn test_validation_details() {
        let fault = Fault::validation(
            "Validation failed",
            vec![FieldError::new("message", "Message cannot be empty")],
        );
        let err = fault.into_app_error(false);
        assert_eq!(err.status_code(), 422);
        let details = err.details().unwrap();
        assert_eq!(details["errors"][0]["field"], "message");
        assert_eq!(details["errors"][0]["message"], "Message cannot be empty");
    }

    #[test]
    fn test_rate_limited_carries_retry_after() {
        let fault = Fault::RateLimited {
            message: "Too many requests".into(),
            retry_after_secs: Some(900),
        };
        let err = fault.into_app_error(false);
        assert_eq!(err.status_code(), 429);
        assert_eq!(err.retry_after_secs(), Some(900));
        assert_eq!(err.details().unwrap()["retryAfter"], 900);
    }

    #[test]
    fn test_internal_disclosure() {
        let disclosed = Fault::internal("boom").into_app_error(true);
        assert_eq!(disclosed.message(), "boom");
        let stack = disclosed.details().unwrap()["stack"].as_str().unwrap();
        assert!(!stack.is_empty());
        assert_ne!(stack, "disabled backtrace");
        assert_ne!(stack, "unsupported backtrace");

        let redacted = Fault::internal("boom").into_app_error(false);
        assert_eq!(redacted.code(), "INTERNAL_ERROR");
        assert_eq!(redacted.message(), "An error occurred");
        assert!(redacted.details().is_none());
    }

    #[test]
    fn test_configuration_uses_default_message() {
        let err: AppError = Fault::Configuration("GOOGLE_GENAI_API_KEY missing".into()).into();
        assert_eq!(err.code(), "CONFIGURATION_ERROR");
        assert_eq!(err.message(), "Service configuration error");
    }
}
