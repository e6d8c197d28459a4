//! Response envelope
//!
//! Every API response, success or error, is wrapped in the same envelope:
//!
//! ```json
//! { "success": true,  "data": ..., "meta": { "timestamp": "...", ... } }
//! { "success": false, "error": { "code": "...", "message": "...", "details": ... },
//!   "meta": { "timestamp": "..." } }
//! ```

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::app_error::AppError;

/// Current time as an RFC 3339 UTC timestamp with millisecond precision
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `meta` object: a timestamp plus any caller-supplied fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub timestamp: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Meta {
    pub fn now() -> Self {
        Self {
            timestamp: timestamp_now(),
            extra: Map::new(),
        }
    }

    pub fn with_extra(extra: Map<String, Value>) -> Self {
        Self {
            timestamp: timestamp_now(),
            extra,
        }
    }

    /// Add a single field
    pub fn insert(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessEnvelope<T> {
    pub success: bool,
    pub data: T,
    pub meta: Meta,
}

impl<T> SuccessEnvelope<T> {
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta = self.meta.insert(key, value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub success: bool,
    pub error: ErrorBody,
    pub meta: Meta,
}

impl ErrorEnvelope {
    pub fn from_app_error(err: &AppError) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                code: err.code().to_owned(),
                message: err.message().to_owned(),
                details: err.details().cloned(),
            },
            meta: Meta::now(),
        }
    }
}

/// `meta.pagination` for page-based listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self {
            page,
            limit,
            total,
            total_pages,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn success<T>(data: T) -> SuccessEnvelope<T> {
    SuccessEnvelope {
        success: true,
        data,
        meta: Meta::now(),
    }
}

/// Success envelope with extra `meta` fields
pub fn success_with<T>(data: T, extra: Map<String, Value>) -> SuccessEnvelope<T> {
    SuccessEnvelope {
        success: true,
        data,
        meta: Meta::with_extra(extra),
    }
}

/// Success envelope for one page of a listing
///
/// ## Examples
/// ```rust
/// use kernel::response::paginated;
///
/// let body = paginated(vec![1, 2, 3], 2, 3, 10);
/// let pagination = &body.meta.extra["pagination"];
/// assert_eq!(pagination["totalPages"], 4);
/// assert_eq!(pagination["hasNextPage"], true);
/// assert_eq!(pagination["hasPrevPage"], true);
/// ```
pub fn paginated<T>(data: Vec<T>, page: u64, limit: u64, total: u64) -> SuccessEnvelope<Vec<T>> {
    let pagination = Pagination::new(page, limit, total);
    let mut extra = Map::new();
    // Pagination only holds integers and bools.
    if let Ok(value) = serde_json::to_value(pagination) {
        extra.insert("pagination".to_owned(), value);
    }
    success_with(data, extra)
}
