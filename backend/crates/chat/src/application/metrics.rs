//! Metrics Use Case
//!
//! Usage and ledger aggregates of one user, plus database health.

use std::sync::Arc;
use std::time::Instant;

use kernel::error::fault::Fault;

use crate::application::config::ChatConfig;
use crate::domain::entity::{DatabaseHealth, LedgerTransaction, TransactionSummary, UserStats};
use crate::domain::repository::{ChatRepository, DatabaseProbe, LedgerRepository};

#[derive(Debug, Clone)]
pub struct MetricsReport {
    pub user_id: String,
    pub stats: UserStats,
    pub summary: TransactionSummary,
    pub recent_transactions: Vec<LedgerTransaction>,
    pub database: DatabaseHealth,
    pub uptime_secs: f64,
}

pub struct MetricsUseCase<R>
where
    R: ChatRepository + LedgerRepository + DatabaseProbe,
{
    repo: Arc<R>,
    config: Arc<ChatConfig>,
    started_at: Instant,
}

impl<R> MetricsUseCase<R>
where
    R: ChatRepository + LedgerRepository + DatabaseProbe + Send + Sync,
{
    pub fn new(repo: Arc<R>, config: Arc<ChatConfig>, started_at: Instant) -> Self {
        Self {
            repo,
            config,
            started_at,
        }
    }

    pub async fn execute(&self, user_id: &str) -> Result<MetricsReport, Fault> {
        let (stats, recent_transactions, summary) = tokio::try_join!(
            self.repo.user_stats(user_id),
            self.repo.list_transactions(user_id, self.config.recent_transactions),
            self.repo.transaction_summary(user_id),
        )?;
        let database = self.repo.probe().await;

        Ok(MetricsReport {
            user_id: user_id.to_string(),
            stats,
            summary,
            recent_transactions,
            database,
            uptime_secs: self.started_at.elapsed().as_secs_f64(),
        })
    }
}
