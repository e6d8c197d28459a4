//! Error Kind - Classification of errors
//!
//! Defines the [`ErrorKind`] enum: the fixed table of machine-readable error
//! codes, their HTTP status and their default message. API clients branch on
//! [`ErrorKind::code`], so the table must stay stable.

use serde::{Deserialize, Serialize};

/// Error code table
///
/// Each variant serializes to its wire code (`BAD_REQUEST`, `RATE_LIMIT_EXCEEDED`, ...).
///
/// ## Examples
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// let kind = ErrorKind::NotFound;
/// assert_eq!(kind.status_code(), 404);
/// assert_eq!(kind.code(), "NOT_FOUND");
/// assert_eq!(kind.default_message(), "Resource not found");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// 400 - malformed request
    BadRequest,
    /// 401 - missing or invalid identity
    Unauthorized,
    /// 403 - identity known, access denied
    Forbidden,
    /// 404 - resource not found
    NotFound,
    /// 405 - method not accepted by the route
    MethodNotAllowed,
    /// 409 - conflicts with current state
    Conflict,
    /// 422 - well-formed but invalid input
    ValidationError,
    /// 429 - quota exceeded, carries `Retry-After`
    RateLimitExceeded,
    /// 500 - unclassified failure
    InternalError,
    /// 501 - route has no handler
    NotImplemented,
    /// 503 - dependency unavailable, carries `Retry-After` when known
    ServiceUnavailable,
    /// 504 - dependency timed out
    GatewayTimeout,
    /// 500 - relational store failure
    DatabaseError,
    /// 500 - generative-AI provider failure
    AiServiceError,
    /// 500 - ledger notarization failure
    BlockchainError,
    /// 500 - service is missing required configuration
    ConfigurationError,
}

impl ErrorKind {
    /// Every code in the table, in declaration order.
    pub const ALL: [ErrorKind; 16] = [
        ErrorKind::BadRequest,
        ErrorKind::Unauthorized,
        ErrorKind::Forbidden,
        ErrorKind::NotFound,
        ErrorKind::MethodNotAllowed,
        ErrorKind::Conflict,
        ErrorKind::ValidationError,
        ErrorKind::RateLimitExceeded,
        ErrorKind::InternalError,
        ErrorKind::NotImplemented,
        ErrorKind::ServiceUnavailable,
        ErrorKind::GatewayTimeout,
        ErrorKind::DatabaseError,
        ErrorKind::AiServiceError,
        ErrorKind::BlockchainError,
        ErrorKind::ConfigurationError,
    ];

    /// HTTP status code for this kind
    ///
    /// ## Examples
    /// ```rust
    /// use kernel::error::kind::ErrorKind;
    /// assert_eq!(ErrorKind::BadRequest.status_code(), 400);
    /// assert_eq!(ErrorKind::RateLimitExceeded.status_code(), 429);
    /// ```
    #[inline]
    pub const fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::MethodNotAllowed => 405,
            ErrorKind::Conflict => 409,
            ErrorKind::ValidationError => 422,
            ErrorKind::RateLimitExceeded => 429,
            ErrorKind::InternalError => 500,
            ErrorKind::NotImplemented => 501,
            ErrorKind::ServiceUnavailable => 503,
            ErrorKind::GatewayTimeout => 504,
            ErrorKind::DatabaseError
            | ErrorKind::AiServiceError
            | ErrorKind::BlockchainError
            | ErrorKind::ConfigurationError => 500,
        }
    }

    /// Wire code placed in `error.code`
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BAD_REQUEST",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::ValidationError => "VALIDATION_ERROR",
            ErrorKind::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ErrorKind::InternalError => "INTERNAL_ERROR",
            ErrorKind::NotImplemented => "NOT_IMPLEMENTED",
            ErrorKind::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            ErrorKind::GatewayTimeout => "GATEWAY_TIMEOUT",
            ErrorKind::DatabaseError => "DATABASE_ERROR",
            ErrorKind::AiServiceError => "AI_SERVICE_ERROR",
            ErrorKind::BlockchainError => "BLOCKCHAIN_ERROR",
            ErrorKind::ConfigurationError => "CONFIGURATION_ERROR",
        }
    }

    /// Message used when the caller does not supply one
    #[inline]
    pub const fn default_message(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Bad request",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "Resource not found",
            ErrorKind::MethodNotAllowed => "Method not allowed",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::ValidationError => "Validation failed",
            ErrorKind::RateLimitExceeded => "Too many requests",
            ErrorKind::InternalError => "Internal server error",
            ErrorKind::NotImplemented => "Not implemented",
            ErrorKind::ServiceUnavailable => "Service temporarily unavailable",
            ErrorKind::GatewayTimeout => "Gateway timeout",
            ErrorKind::DatabaseError => "Database operation failed",
            ErrorKind::AiServiceError => "AI service error",
            ErrorKind::BlockchainError => "Blockchain operation failed",
            ErrorKind::ConfigurationError => "Service configuration error",
        }
    }

    /// Whether responses of this kind advertise `Retry-After`
    #[inline]
    pub const fn supports_retry_after(&self) -> bool {
        matches!(
            self,
            ErrorKind::RateLimitExceeded | ErrorKind::ServiceUnavailable
        )
    }

    /// 5xx kinds. These should be logged at error level.
    #[inline]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
