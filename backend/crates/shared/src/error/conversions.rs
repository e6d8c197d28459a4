//! Error conversions
//!
//! Tags foreign errors as [`Fault`]s and renders [`AppError`] as an HTTP
//! response (feature `axum`).

use super::fault::Fault;
#[cfg(feature = "sqlx")]
use super::fault::{Cause, Dependency};

// ============================================================================
// serde_json conversions
// ============================================================================

impl From<serde_json::Error> for Fault {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_eof() {
            Fault::BadRequest("Invalid JSON in request body".to_owned())
        } else if err.is_data() {
            Fault::BadRequest(format!("Invalid request body: {err}"))
        } else {
            Fault::internal(format!("JSON serialization error: {err}"))
        }
    }
}

// ============================================================================
// SQLx conversions (feature-gated)
// ============================================================================

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for Fault {
    fn from(err: sqlx::Error) -> Self {
        let cause = match &err {
            sqlx::Error::RowNotFound => return Fault::NotFound("Record not found".to_owned()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Cause::Unavailable
            }
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                // Class 53 (insufficient resources), class 57 (operator intervention)
                // https://www.postgresql.org/docs/current/errcodes-appendix.html
                Some("53000" | "53100" | "53200" | "53300") => Cause::Unavailable,
                Some("57000" | "57P01" | "57P02" | "57P03") => Cause::Unavailable,
                Some("57014") => Cause::Timeout,
                _ => Cause::Failed,
            },
            _ => Cause::Failed,
        };
        Fault::dependency(Dependency::Database, cause, err)
    }
}

// ============================================================================
// Axum conversions (feature-gated)
// ============================================================================

#[cfg(feature = "axum")]
mod http_response {
    use axum::Json;
    use axum::http::{HeaderValue, StatusCode, header};
    use axum::response::{IntoResponse, Response};
    use serde::Serialize;

    use crate::error::app_error::AppError;
    use crate::response::{ErrorEnvelope, SuccessEnvelope};

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            let status =
                StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

            let mut response = (status, Json(ErrorEnvelope::from_app_error(&self))).into_response();

            if self.kind().supports_retry_after() {
                if let Some(secs) = self.retry_after_secs() {
                    response
                        .headers_mut()
                        .insert(header::RETRY_AFTER, HeaderValue::from(secs));
                }
            }
            response
        }
    }

    impl<T: Serialize> IntoResponse for SuccessEnvelope<T> {
        fn into_response(self) -> Response {
            (StatusCode::OK, Json(self)).into_response()
        }
    }
}
