//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::application::history::{DeleteOutcome, HistoryPage};
use crate::application::ledger::TransactionsPage;
use crate::application::metrics::MetricsReport;
use crate::application::send_message::SendMessageOutput;
use crate::domain::entity::{
    ChatMessage, DatabaseHealth, LedgerReceipt, LedgerTransaction, Role, TransactionSummary,
};

/// ISO 8601 with milliseconds and a `Z` suffix
fn iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================================================
// Send Message
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageDto {
    pub tokens_used: i32,
    pub cost: f64,
    pub cost_formatted: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainDto {
    pub transaction_id: String,
    pub consensus_timestamp: String,
    pub status: String,
    pub carbon_impact: f64,
    pub carbon_impact_formatted: String,
}

impl From<&LedgerReceipt> for BlockchainDto {
    fn from(receipt: &LedgerReceipt) -> Self {
        Self {
            transaction_id: receipt.transaction_id.clone(),
            consensus_timestamp: iso(receipt.consensus_timestamp),
            status: receipt.status.clone(),
            carbon_impact: receipt.carbon_impact,
            carbon_impact_formatted: format!("{:.2}g CO₂ saved", receipt.carbon_impact.abs()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RemainingDto {
    pub remaining: u32,
}

/// Reply data of `POST /api/chat/v2`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReplyResponse {
    pub message: String,
    pub model: String,
    pub usage: UsageDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blockchain: Option<BlockchainDto>,
    pub rate_limit: RemainingDto,
}

impl ChatReplyResponse {
    pub fn new(output: SendMessageOutput, remaining: u32) -> Self {
        Self {
            blockchain: output.receipt.as_ref().map(BlockchainDto::from),
            usage: UsageDto {
                tokens_used: output.tokens_used,
                cost: output.cost,
                cost_formatted: format!("${:.6}", output.cost),
            },
            message: output.reply,
            model: output.model,
            rate_limit: RemainingDto { remaining },
        }
    }
}

/// Receipt as reported by the legacy route
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyReceiptDto {
    pub transaction_id: String,
    pub consensus_timestamp: String,
    pub status: String,
    pub cost: f64,
    pub carbon_impact: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyChatData {
    pub response: String,
    pub model: String,
    pub tokens_used: i32,
    pub cost: f64,
    /// Serialised as `null` when the call was not notarised
    pub hedera: Option<LegacyReceiptDto>,
    pub rate_limit: RemainingDto,
}

/// Body of `POST /api/chat`, which predates the envelope's `meta`
#[derive(Debug, Clone, Serialize)]
pub struct LegacyChatResponse {
    pub success: bool,
    pub data: LegacyChatData,
}

impl LegacyChatResponse {
    /// `remaining` is the check's decision; this shape reports one fewer,
    /// counting the call it answers
    pub fn new(output: SendMessageOutput, remaining: u32) -> Self {
        Self {
            success: true,
            data: LegacyChatData {
                hedera: output.receipt.map(|receipt| LegacyReceiptDto {
                    transaction_id: receipt.transaction_id,
                    consensus_timestamp: iso(receipt.consensus_timestamp),
                    status: receipt.status,
                    cost: receipt.ledger_cost,
                    carbon_impact: receipt.carbon_impact,
                }),
                response: output.reply,
                model: output.model,
                tokens_used: output.tokens_used,
                cost: output.cost,
                rate_limit: RemainingDto {
                    remaining: remaining.saturating_sub(1),
                },
            },
        }
    }
}

// ============================================================================
// History
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: i64,
    pub role: Role,
    pub content: String,
    pub model: Option<String>,
    pub tokens_used: Option<i32>,
    pub cost: Option<f64>,
    pub ledger_transaction_id: Option<String>,
    pub created_at: String,
}

impl From<ChatMessage> for MessageDto {
    fn from(message: ChatMessage) -> Self {
        Self {
            id: message.id,
            role: message.role,
            content: message.content,
            model: message.model,
            tokens_used: message.tokens_used,
            cost: message.cost,
            ledger_transaction_id: message.ledger_transaction_id,
            created_at: iso(message.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStatsDto {
    pub total_messages: i64,
    pub total_tokens_used: i64,
    pub total_cost: f64,
    /// Six decimals
    pub avg_cost_per_message: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPaginationDto {
    pub limit: i64,
    pub returned: usize,
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub messages: Vec<MessageDto>,
    pub stats: HistoryStatsDto,
    pub pagination: HistoryPaginationDto,
}

impl From<HistoryPage> for HistoryResponse {
    fn from(page: HistoryPage) -> Self {
        let returned = page.messages.len();
        Self {
            stats: HistoryStatsDto {
                total_messages: page.stats.total_messages,
                total_tokens_used: page.stats.total_tokens_used,
                total_cost: page.stats.total_cost,
                avg_cost_per_message: format!("{:.6}", page.stats.avg_cost_per_message()),
            },
            messages: page.messages.into_iter().map(MessageDto::from).collect(),
            pagination: HistoryPaginationDto {
                limit: page.limit,
                returned,
                has_more: page.has_more,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub deleted: u64,
    pub message: String,
}

impl From<DeleteOutcome> for DeleteResponse {
    fn from(outcome: DeleteOutcome) -> Self {
        Self {
            deleted: outcome.deleted,
            message: outcome.message(),
        }
    }
}

// ============================================================================
// Metrics
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsDto {
    pub total_messages: i64,
    pub total_tokens_used: i64,
    pub total_cost: f64,
    pub avg_cost_per_message: String,
    pub avg_tokens_per_message: i64,
    pub first_message_at: Option<String>,
    pub last_message_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsUserDto {
    pub id: String,
    pub stats: UserStatsDto,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDto {
    /// Ledger transaction id
    pub id: String,
    pub timestamp: String,
    pub status: String,
    pub cost: f64,
    pub carbon_impact: f64,
    pub api_call_type: String,
}

impl From<LedgerTransaction> for TransactionDto {
    fn from(tx: LedgerTransaction) -> Self {
        Self {
            id: tx.transaction_id,
            timestamp: iso(tx.consensus_timestamp),
            status: tx.status,
            cost: tx.cost,
            carbon_impact: tx.carbon_impact,
            api_call_type: tx.api_call_type,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsLedgerDto {
    pub total_transactions: i64,
    pub total_cost: f64,
    pub total_carbon_saved: f64,
    pub recent_transactions: Vec<TransactionDto>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemDto {
    pub database: DatabaseHealth,
    /// Seconds since startup
    pub uptime: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsResponse {
    pub user: MetricsUserDto,
    pub blockchain: MetricsLedgerDto,
    pub system: SystemDto,
}

impl From<MetricsReport> for MetricsResponse {
    fn from(report: MetricsReport) -> Self {
        let stats = &report.stats;
        Self {
            user: MetricsUserDto {
                id: report.user_id,
                stats: UserStatsDto {
                    total_messages: stats.total_messages,
                    total_tokens_used: stats.total_tokens_used,
                    total_cost: stats.total_cost,
                    avg_cost_per_message: format!("{:.6}", stats.avg_cost_per_message()),
                    avg_tokens_per_message: stats.avg_tokens_per_message(),
                    first_message_at: stats.first_message_at.map(iso),
                    last_message_at: stats.last_message_at.map(iso),
                },
            },
            blockchain: MetricsLedgerDto {
                total_transactions: report.summary.total_transactions,
                total_cost: report.summary.total_cost,
                total_carbon_saved: report.summary.total_carbon_saved,
                recent_transactions: report
                    .recent_transactions
                    .into_iter()
                    .map(TransactionDto::from)
                    .collect(),
            },
            system: SystemDto {
                database: report.database,
                uptime: report.uptime_secs,
            },
        }
    }
}

// ============================================================================
// Ledger
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTransactionDto {
    pub id: i64,
    pub transaction_id: String,
    pub consensus_timestamp: String,
    pub status: String,
    pub cost: f64,
    pub carbon_impact: f64,
    pub api_call_type: String,
    pub metadata: serde_json::Value,
    pub created_at: String,
}

impl From<LedgerTransaction> for LedgerTransactionDto {
    fn from(tx: LedgerTransaction) -> Self {
        Self {
            id: tx.id,
            transaction_id: tx.transaction_id,
            consensus_timestamp: iso(tx.consensus_timestamp),
            status: tx.status,
            cost: tx.cost,
            carbon_impact: tx.carbon_impact,
            api_call_type: tx.api_call_type,
            metadata: tx.metadata,
            created_at: iso(tx.created_at),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummaryDto {
    pub total_transactions: i64,
    pub total_cost: f64,
    pub total_carbon_saved: f64,
}

impl From<TransactionSummary> for TransactionSummaryDto {
    fn from(summary: TransactionSummary) -> Self {
        Self {
            total_transactions: summary.total_transactions,
            total_cost: summary.total_cost,
            total_carbon_saved: summary.total_carbon_saved,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionsResponse {
    pub transactions: Vec<LedgerTransactionDto>,
    pub summary: TransactionSummaryDto,
}

impl From<TransactionsPage> for TransactionsResponse {
    fn from(page: TransactionsPage) -> Self {
        Self {
            transactions: page
                .transactions
                .into_iter()
                .map(LedgerTransactionDto::from)
                .collect(),
            summary: page.summary.into(),
        }
    }
}
