//! PostgreSQL Repository Implementations

use std::time::Instant;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::entity::{
    ChatMessage, DatabaseHealth, LedgerTransaction, NewChatMessage, NewLedgerTransaction,
    TransactionSummary, UserStats,
};
use crate::domain::repository::{ChatRepository, DatabaseProbe, LedgerRepository};
use crate::error::{ChatError, ChatResult};

/// PostgreSQL-backed chat repository
#[derive(Clone)]
pub struct PgChatRepository {
    pool: PgPool,
}

impl PgChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

// ============================================================================
// Chat Repository Implementation
// ============================================================================

impl ChatRepository for PgChatRepository {
    async fn save_message(&self, message: &NewChatMessage) -> ChatResult<ChatMessage> {
        let row = sqlx::query_as::<_, ChatMessageRow>(
            r#"
            INSERT INTO chat_messages (
                user_id,
                role,
                content,
                model,
                tokens_used,
                cost,
                ledger_transaction_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING
                id,
                user_id,
                role,
                content,
                model,
                tokens_used,
                cost,
                ledger_transaction_id,
                created_at
            "#,
        )
        .bind(&message.user_id)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(&message.model)
        .bind(message.tokens_used)
        .bind(message.cost)
        .bind(&message.ledger_transaction_id)
        .fetch_one(&self.pool)
        .await?;

        row.into_message()
    }

    async fn list_messages(&self, user_id: &str, limit: i64) -> ChatResult<Vec<ChatMessage>> {
        let rows = sqlx::query_as::<_, ChatMessageRow>(
            r#"
            SELECT
                id,
                user_id,
                role,
                content,
                model,
                tokens_used,
                cost,
                ledger_transaction_id,
                created_at
            FROM chat_messages
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ChatMessageRow::into_message).collect()
    }

    async fn delete_messages(&self, user_id: &str, days: u32) -> ChatResult<u64> {
        let result = if days == 0 {
            sqlx::query("DELETE FROM chat_messages WHERE user_id = $1")
                .bind(user_id)
                .execute(&self.pool)
                .await?
        } else {
            sqlx::query(
                r#"
                DELETE FROM chat_messages
                WHERE user_id = $1
                  AND created_at < NOW() - make_interval(days => $2)
                "#,
            )
            .bind(user_id)
            .bind(i32::try_from(days).unwrap_or(i32::MAX))
            .execute(&self.pool)
            .await?
        };

        Ok(result.rows_affected())
    }

    async fn user_stats(&self, user_id: &str) -> ChatResult<UserStats> {
        let (total_messages, total_tokens_used, total_cost, first_message_at, last_message_at): (
            i64,
            i64,
            f64,
            Option<DateTime<Utc>>,
            Option<DateTime<Utc>>,
        ) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(tokens_used), 0)::BIGINT,
                COALESCE(SUM(cost), 0)::DOUBLE PRECISION,
                MIN(created_at),
                MAX(created_at)
            FROM chat_messages
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(UserStats {
            total_messages,
            total_tokens_used,
            total_cost,
            first_message_at,
            last_message_at,
        })
    }
}

// ============================================================================
// Ledger Repository Implementation
// ============================================================================

impl LedgerRepository for PgChatRepository {
    async fn save_transaction(&self, tx: &NewLedgerTransaction) -> ChatResult<LedgerTransaction> {
        let row = sqlx::query_as::<_, LedgerTransactionRow>(
            r#"
            INSERT INTO ledger_transactions (
                user_id,
                transaction_id,
                consensus_timestamp,
                status,
                cost,
                carbon_impact,
                api_call_type,
                metadata
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING
                id,
                user_id,
                transaction_id,
                consensus_timestamp,
                status,
                cost,
                carbon_impact,
                api_call_type,
                metadata,
                created_at
            "#,
        )
        .bind(&tx.user_id)
        .bind(&tx.transaction_id)
        .bind(tx.consensus_timestamp)
        .bind(&tx.status)
        .bind(tx.cost)
        .bind(tx.carbon_impact)
        .bind(&tx.api_call_type)
        .bind(&tx.metadata)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list_transactions(&self, user_id: &str, limit: i64) -> ChatResult<Vec<LedgerTransaction>> {
        let rows = sqlx::query_as::<_, LedgerTransactionRow>(
            r#"
            SELECT
                id,
                user_id,
                transaction_id,
                consensus_timestamp,
                status,
                cost,
                carbon_impact,
                api_call_type,
                metadata,
                created_at
            FROM ledger_transactions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn transaction_summary(&self, user_id: &str) -> ChatResult<TransactionSummary> {
        let (total_transactions, total_cost, total_carbon_saved): (i64, f64, f64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(cost), 0)::DOUBLE PRECISION,
                COALESCE(ABS(SUM(carbon_impact)), 0)::DOUBLE PRECISION
            FROM ledger_transactions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(TransactionSummary {
            total_transactions,
            total_cost,
            total_carbon_saved,
        })
    }
}

// ============================================================================
// Database Probe Implementation
// ============================================================================

impl DatabaseProbe for PgChatRepository {
    async fn probe(&self) -> DatabaseHealth {
        let started = Instant::now();
        let connected = match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");
                false
            }
        };

        let idle = u32::try_from(self.pool.num_idle()).unwrap_or(u32::MAX);
        DatabaseHealth {
            connected,
            response_time: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            active_connections: self.pool.size().saturating_sub(idle),
        }
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct ChatMessageRow {
    id: i64,
    user_id: String,
    role: String,
    content: String,
    model: Option<String>,
    tokens_used: Option<i32>,
    cost: Option<f64>,
    ledger_transaction_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl ChatMessageRow {
    fn into_message(self) -> ChatResult<ChatMessage> {
        let role = self.role.parse().map_err(ChatError::CorruptRow)?;

        Ok(ChatMessage {
            id: self.id,
            user_id: self.user_id,
            role,
            content: self.content,
            model: self.model,
            tokens_used: self.tokens_used,
            cost: self.cost,
            ledger_transaction_id: self.ledger_transaction_id,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LedgerTransactionRow {
    id: i64,
    user_id: String,
    transaction_id: String,
    consensus_timestamp: DateTime<Utc>,
    status: String,
    cost: f64,
    carbon_impact: f64,
    api_call_type: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl From<LedgerTransactionRow> for LedgerTransaction {
    fn from(row: LedgerTransactionRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            transaction_id: row.transaction_id,
            consensus_timestamp: row.consensus_timestamp,
            status: row.status,
            cost: row.cost,
            carbon_impact: row.carbon_impact,
            api_call_type: row.api_call_type,
            metadata: row.metadata,
            created_at: row.created_at,
        }
    }
}
