//! Chat History Use Cases
//!
//! Listing and deleting a user's stored messages.

use std::sync::Arc;

use kernel::error::fault::Fault;

use crate::application::validation::HistoryQuery;
use crate::domain::entity::{ChatMessage, UserStats};
use crate::domain::repository::ChatRepository;

/// One page of history
#[derive(Debug, Clone)]
pub struct HistoryPage {
    pub messages: Vec<ChatMessage>,
    pub stats: UserStats,
    pub limit: i64,
    /// The unfiltered page was full, so older messages may exist
    pub has_more: bool,
}

/// List history use case
pub struct ListHistoryUseCase<R>
where
    R: ChatRepository,
{
    repo: Arc<R>,
}

impl<R> ListHistoryUseCase<R>
where
    R: ChatRepository + Send + Sync,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Newest `limit` messages, then narrowed to those created before `before`
    pub async fn execute(&self, user_id: &str, query: HistoryQuery) -> Result<HistoryPage, Fault> {
        let messages = self.repo.list_messages(user_id, query.limit).await?;
        let has_more = messages.len() as i64 == query.limit;

        let messages = match query.before {
            Some(before) => messages
                .into_iter()
                .filter(|message| message.created_at < before)
                .collect(),
            None => messages,
        };

        let stats = self.repo.user_stats(user_id).await?;

        tracing::info!(user_id, message_count = messages.len(), "Chat history retrieved");

        Ok(HistoryPage {
            messages,
            stats,
            limit: query.limit,
            has_more,
        })
    }
}

/// Outcome of a history deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted: u64,
    pub days: u32,
}

impl DeleteOutcome {
    pub fn message(&self) -> String {
        if self.days > 0 {
            format!(
                "Deleted {} messages older than {} days",
                self.deleted, self.days
            )
        } else {
            format!("Deleted all {} messages", self.deleted)
        }
    }
}

/// Delete history use case
pub struct DeleteHistoryUseCase<R>
where
    R: ChatRepository,
{
    repo: Arc<R>,
}

impl<R> DeleteHistoryUseCase<R>
where
    R: ChatRepository + Send + Sync,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Delete messages older than `days`; 0 deletes all of them
    pub async fn execute(&self, user_id: &str, days: u32) -> Result<DeleteOutcome, Fault> {
        let deleted = self.repo.delete_messages(user_id, days).await?;

        tracing::info!(user_id, deleted, days, "Chat messages deleted");

        Ok(DeleteOutcome { deleted, days })
    }
}
