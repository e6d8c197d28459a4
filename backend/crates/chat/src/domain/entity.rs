//! Chat Entities
//!
//! Stored messages, ledger records and the aggregates read back from them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Messages
// ============================================================================

/// Author of a stored message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Persisted chat message
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: i64,
    pub user_id: String,
    pub role: Role,
    pub content: String,
    pub model: Option<String>,
    pub tokens_used: Option<i32>,
    pub cost: Option<f64>,
    pub ledger_transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Message to be inserted; id and timestamp are assigned by the store
#[derive(Debug, Clone, PartialEq)]
pub struct NewChatMessage {
    pub user_id: String,
    pub role: Role,
    pub content: String,
    pub model: Option<String>,
    pub tokens_used: Option<i32>,
    pub cost: Option<f64>,
    pub ledger_transaction_id: Option<String>,
}

impl NewChatMessage {
    /// User turn as received
    pub fn user(user_id: &str, content: &str, model: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            role: Role::User,
            content: content.to_string(),
            model: Some(model.to_string()),
            tokens_used: None,
            cost: None,
            ledger_transaction_id: None,
        }
    }
}

/// Prior turn supplied by the client with a new message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub role: Role,
    pub content: String,
}

/// Per-user message aggregates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserStats {
    pub total_messages: i64,
    pub total_tokens_used: i64,
    pub total_cost: f64,
    pub first_message_at: Option<DateTime<Utc>>,
    pub last_message_at: Option<DateTime<Utc>>,
}

impl UserStats {
    pub fn avg_cost_per_message(&self) -> f64 {
        if self.total_messages > 0 {
            self.total_cost / self.total_messages as f64
        } else {
            0.0
        }
    }

    pub fn avg_tokens_per_message(&self) -> i64 {
        if self.total_messages > 0 {
            (self.total_tokens_used as f64 / self.total_messages as f64).round() as i64
        } else {
            0
        }
    }
}

// ============================================================================
// Ledger
// ============================================================================

/// Proof returned by the ledger for one notarised API call
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerReceipt {
    pub transaction_id: String,
    pub consensus_timestamp: DateTime<Utc>,
    pub status: String,
    pub ledger_cost: f64,
    /// Grams of CO2; negative means saved
    pub carbon_impact: f64,
}

/// What gets notarised for a generated reply
#[derive(Debug, Clone, PartialEq)]
pub struct ApiCallRecord {
    pub user_id: String,
    pub query: String,
    pub model: String,
    pub tokens_used: i32,
    pub cost: f64,
}

/// Persisted ledger transaction
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerTransaction {
    pub id: i64,
    pub user_id: String,
    pub transaction_id: String,
    pub consensus_timestamp: DateTime<Utc>,
    pub status: String,
    pub cost: f64,
    pub carbon_impact: f64,
    pub api_call_type: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Ledger transaction to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewLedgerTransaction {
    pub user_id: String,
    pub transaction_id: String,
    pub consensus_timestamp: DateTime<Utc>,
    pub status: String,
    pub cost: f64,
    pub carbon_impact: f64,
    pub api_call_type: String,
    pub metadata: serde_json::Value,
}

impl NewLedgerTransaction {
    /// Record of a chat completion notarised as `receipt`
    pub fn chat(user_id: &str, receipt: &LedgerReceipt, model: &str, tokens_used: i32, ai_cost: f64) -> Self {
        Self {
            user_id: user_id.to_string(),
            transaction_id: receipt.transaction_id.clone(),
            consensus_timestamp: receipt.consensus_timestamp,
            status: receipt.status.clone(),
            cost: receipt.ledger_cost,
            carbon_impact: receipt.carbon_impact,
            api_call_type: "chat".to_string(),
            metadata: serde_json::json!({
                "model": model,
                "tokensUsed": tokens_used,
                "aiCost": ai_cost,
            }),
        }
    }
}

/// Per-user ledger aggregates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionSummary {
    pub total_transactions: i64,
    pub total_cost: f64,
    pub total_carbon_saved: f64,
}

// ============================================================================
// Database health
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseHealth {
    pub connected: bool,
    /// Round-trip of a trivial query, in milliseconds
    pub response_time: u64,
    pub active_connections: u32,
}
