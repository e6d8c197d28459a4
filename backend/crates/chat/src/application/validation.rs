//! Request validation and sanitisation
//!
//! Field errors are collected rather than failing on the first one, and
//! reported together as one validation fault.

use chrono::{DateTime, NaiveDate, Utc};
use kernel::error::fault::{FieldError, Fault};
use serde_json::Value;

use crate::application::config::ChatConfig;
use crate::domain::entity::{HistoryTurn, Role};

pub const VALIDATION_FAILED: &str = "Validation failed";
pub const LIMIT_OUT_OF_RANGE: &str = "Limit must be between 1 and 100";
pub const INVALID_BEFORE: &str = "Invalid date format for \"before\" parameter";
pub const NEGATIVE_DAYS: &str = "Days must be a non-negative number";

/// A validated send-message request
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<HistoryTurn>,
}

impl ChatRequest {
    /// Validate a `{message, chatHistory?}` body
    pub fn from_json(body: &Value, config: &ChatConfig) -> Result<Self, Fault> {
        let mut errors = Vec::new();

        let Some(fields) = body.as_object() else {
            errors.push(FieldError::new("", "Expected object"));
            return Err(Fault::validation(VALIDATION_FAILED, errors));
        };

        let message = match fields.get("message") {
            None | Some(Value::Null) => {
                errors.push(FieldError::new("message", "Required"));
                None
            }
            Some(Value::String(message)) => {
                let chars = message.chars().count();
                if chars == 0 {
                    errors.push(FieldError::new("message", "Message cannot be empty"));
                } else if chars > config.max_message_chars {
                    errors.push(FieldError::new(
                        "message",
                        format!(
                            "Message cannot exceed {} characters",
                            config.max_message_chars
                        ),
                    ));
                }
                Some(message.clone())
            }
            Some(_) => {
                errors.push(FieldError::new("message", "Expected string"));
                None
            }
        };

        let history = match fields.get("chatHistory") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(turns)) => turns
                .iter()
                .enumerate()
                .filter_map(|(i, turn)| history_turn(i, turn, &mut errors))
                .collect(),
            Some(_) => {
                errors.push(FieldError::new("chatHistory", "Expected array"));
                Vec::new()
            }
        };

        match message {
            Some(message) if errors.is_empty() => Ok(Self { message, history }),
            _ => Err(Fault::validation(VALIDATION_FAILED, errors)),
        }
    }
}

fn history_turn(index: usize, turn: &Value, errors: &mut Vec<FieldError>) -> Option<HistoryTurn> {
    let field = |name: &str| format!("chatHistory.{index}.{name}");

    let Some(turn) = turn.as_object() else {
        errors.push(FieldError::new(format!("chatHistory.{index}"), "Expected object"));
        return None;
    };

    let role = match turn.get("role").and_then(Value::as_str) {
        Some("user") => Some(Role::User),
        Some("assistant") => Some(Role::Assistant),
        _ => {
            errors.push(FieldError::new(
                field("role"),
                "Invalid enum value. Expected 'user' | 'assistant'",
            ));
            None
        }
    };

    let content = match turn.get("content") {
        Some(Value::String(content)) => Some(content.clone()),
        None | Some(Value::Null) => {
            errors.push(FieldError::new(field("content"), "Required"));
            None
        }
        Some(_) => {
            errors.push(FieldError::new(field("content"), "Expected string"));
            None
        }
    };

    Some(HistoryTurn {
        role: role?,
        content: content?,
    })
}

/// Strip HTML tags and collapse whitespace runs to single spaces
pub fn sanitize_user_input(input: &str) -> String {
    let mut stripped = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(open) = rest.find('<') {
        let Some(close) = rest[open..].find('>') else {
            break;
        };
        stripped.push_str(&rest[..open]);
        rest = &rest[open + close + 1..];
    }
    stripped.push_str(rest);

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// Query parameters
// ============================================================================

/// Raw history query string
#[derive(Debug, Default, serde::Deserialize)]
pub struct HistoryParams {
    pub limit: Option<String>,
    pub before: Option<String>,
}

/// Validated history query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryQuery {
    pub limit: i64,
    pub before: Option<DateTime<Utc>>,
}

impl HistoryQuery {
    pub fn parse(params: &HistoryParams, config: &ChatConfig) -> Result<Self, Fault> {
        let limit = match present(&params.limit) {
            None => config.default_history_limit,
            Some(raw) => parse_limit(raw, config)?,
        };

        let before = present(&params.before)
            .map(|raw| parse_timestamp(raw).ok_or_else(|| Fault::bad_request(INVALID_BEFORE)))
            .transpose()?;

        Ok(Self { limit, before })
    }
}

/// Raw delete query string
#[derive(Debug, Default, serde::Deserialize)]
pub struct DeleteParams {
    pub days: Option<String>,
}

impl DeleteParams {
    /// Retention in days; absent means 0, which deletes everything
    pub fn days(&self) -> Result<u32, Fault> {
        match present(&self.days) {
            None => Ok(0),
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|_| Fault::bad_request(NEGATIVE_DAYS)),
        }
    }
}

/// Raw ledger listing query string
#[derive(Debug, Default, serde::Deserialize)]
pub struct TransactionParams {
    pub limit: Option<String>,
}

impl TransactionParams {
    /// Same bounds as history, defaulting to the maximum
    pub fn limit(&self, config: &ChatConfig) -> Result<i64, Fault> {
        match present(&self.limit) {
            None => Ok(config.max_history_limit),
            Some(raw) => parse_limit(raw, config),
        }
    }
}

fn parse_limit(raw: &str, config: &ChatConfig) -> Result<i64, Fault> {
    raw.parse::<i64>()
        .ok()
        .filter(|limit| (1..=config.max_history_limit).contains(limit))
        .ok_or_else(|| Fault::bad_request(LIMIT_OUT_OF_RANGE))
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// RFC 3339 timestamp, or a bare date taken as UTC midnight
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc())
}
