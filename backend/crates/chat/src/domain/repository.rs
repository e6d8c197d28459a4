//! Repository and Collaborator Traits
//!
//! Interfaces for persistence and external services. Implementations are in
//! the infrastructure layer.

use kernel::error::fault::Fault;

use crate::domain::entity::{
    ApiCallRecord, ChatMessage, DatabaseHealth, HistoryTurn, LedgerReceipt, LedgerTransaction,
    NewChatMessage, NewLedgerTransaction, TransactionSummary, UserStats,
};
use crate::error::{ChatResult, LedgerError};

/// Chat message repository trait
#[trait_variant::make(ChatRepository: Send)]
pub trait LocalChatRepository {
    /// Insert a message
    async fn save_message(&self, message: &NewChatMessage) -> ChatResult<ChatMessage>;

    /// Newest-first messages of a user
    async fn list_messages(&self, user_id: &str, limit: i64) -> ChatResult<Vec<ChatMessage>>;

    /// Delete messages older than `days`; 0 deletes all of them
    async fn delete_messages(&self, user_id: &str, days: u32) -> ChatResult<u64>;

    /// Message aggregates of a user
    async fn user_stats(&self, user_id: &str) -> ChatResult<UserStats>;
}

/// Ledger transaction repository trait
#[trait_variant::make(LedgerRepository: Send)]
pub trait LocalLedgerRepository {
    /// Insert a transaction
    async fn save_transaction(&self, tx: &NewLedgerTransaction) -> ChatResult<LedgerTransaction>;

    /// Newest-first transactions of a user
    async fn list_transactions(&self, user_id: &str, limit: i64) -> ChatResult<Vec<LedgerTransaction>>;

    /// Transaction aggregates of a user
    async fn transaction_summary(&self, user_id: &str) -> ChatResult<TransactionSummary>;
}

/// Connectivity check against the database
#[trait_variant::make(DatabaseProbe: Send)]
pub trait LocalDatabaseProbe {
    /// Never fails; an unreachable database reports `connected: false`
    async fn probe(&self) -> DatabaseHealth;
}

/// A generated reply
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub text: String,
    pub tokens_used: i32,
    pub model: String,
}

/// Generative model
#[trait_variant::make(TextGenerator: Send)]
pub trait LocalTextGenerator {
    /// Model name reported with replies
    fn model(&self) -> &str;

    /// Reply to `message` given the prior `history`
    ///
    /// Failures are tagged [`Fault::Dependency`] with the AI service, or
    /// [`Fault::Configuration`] when the generator has no credentials.
    async fn generate(&self, message: &str, history: &[HistoryTurn]) -> Result<Generation, Fault>;
}

/// Ledger that notarises API calls
#[trait_variant::make(LedgerNotary: Send)]
pub trait LocalLedgerNotary {
    async fn notarize(&self, call: &ApiCallRecord) -> Result<LedgerReceipt, LedgerError>;
}
