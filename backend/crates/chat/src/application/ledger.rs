//! Ledger Transactions Use Case

use std::sync::Arc;

use kernel::error::fault::Fault;

use crate::domain::entity::{LedgerTransaction, TransactionSummary};
use crate::domain::repository::LedgerRepository;

#[derive(Debug, Clone)]
pub struct TransactionsPage {
    pub transactions: Vec<LedgerTransaction>,
    pub summary: TransactionSummary,
}

/// The caller's recorded ledger transactions, newest first
pub struct ListTransactionsUseCase<R>
where
    R: LedgerRepository,
{
    repo: Arc<R>,
}

impl<R> ListTransactionsUseCase<R>
where
    R: LedgerRepository + Send + Sync,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, user_id: &str, limit: i64) -> Result<TransactionsPage, Fault> {
        let (transactions, summary) = tokio::try_join!(
            self.repo.list_transactions(user_id, limit),
            self.repo.transaction_summary(user_id),
        )?;

        tracing::debug!(user_id, count = transactions.len(), "Ledger transactions retrieved");

        Ok(TransactionsPage {
            transactions,
            summary,
        })
    }
}
