//! Send Message Use Case
//!
//! Generates a reply, then notarises and persists the exchange. Only
//! generation can fail the request; every later step is best effort.

use std::sync::Arc;

use gateway::best_effort;
use kernel::error::fault::Fault;
use platform::rate_limit::{FixedWindowLimiter, RateLimitStore};

use crate::application::config::ChatConfig;
use crate::domain::entity::{
    ApiCallRecord, HistoryTurn, LedgerReceipt, NewChatMessage, NewLedgerTransaction, Role,
};
use crate::domain::repository::{ChatRepository, Generation, LedgerNotary, LedgerRepository, TextGenerator};

/// Send message input
#[derive(Debug, Clone)]
pub struct SendMessageInput {
    pub user_id: String,
    /// Already sanitised
    pub message: String,
    pub history: Vec<HistoryTurn>,
}

/// Send message output
#[derive(Debug, Clone)]
pub struct SendMessageOutput {
    pub reply: String,
    pub model: String,
    pub tokens_used: i32,
    /// USD
    pub cost: f64,
    pub receipt: Option<LedgerReceipt>,
}

/// Send message use case
pub struct SendMessageUseCase<R, G, N, S>
where
    R: ChatRepository + LedgerRepository,
    G: TextGenerator,
    N: LedgerNotary,
    S: RateLimitStore,
{
    repo: Arc<R>,
    generator: Arc<G>,
    notary: Arc<N>,
    limiter: FixedWindowLimiter<S>,
    config: Arc<ChatConfig>,
}

impl<R, G, N, S> SendMessageUseCase<R, G, N, S>
where
    R: ChatRepository + LedgerRepository + Send + Sync,
    G: TextGenerator + Send + Sync,
    N: LedgerNotary + Send + Sync,
    S: RateLimitStore + Send + Sync,
{
    pub fn new(
        repo: Arc<R>,
        generator: Arc<G>,
        notary: Arc<N>,
        limiter: FixedWindowLimiter<S>,
        config: Arc<ChatConfig>,
    ) -> Self {
        Self {
            repo,
            generator,
            notary,
            limiter,
            config,
        }
    }

    pub async fn execute(&self, input: SendMessageInput) -> Result<SendMessageOutput, Fault> {
        tracing::info!(
            user_id = %input.user_id,
            message_length = input.message.chars().count(),
            history_length = input.history.len(),
            "Chat request received"
        );

        let generation = self.generator.generate(&input.message, &input.history).await?;
        let cost = self.config.cost(generation.tokens_used);

        let receipt = best_effort(
            "ledger notarisation",
            self.notary.notarize(&ApiCallRecord {
                user_id: input.user_id.clone(),
                query: input.message.clone(),
                model: generation.model.clone(),
                tokens_used: generation.tokens_used,
                cost,
            }),
        )
        .await;

        if let Some(receipt) = &receipt {
            tracing::info!(
                transaction_id = %receipt.transaction_id,
                user_id = %input.user_id,
                "API call notarised"
            );
        }

        self.persist(&input, &generation, cost, receipt.as_ref()).await;

        Ok(SendMessageOutput {
            reply: generation.text,
            model: generation.model,
            tokens_used: generation.tokens_used,
            cost,
            receipt,
        })
    }

    /// Each write is attempted independently; none of them fails the request
    async fn persist(
        &self,
        input: &SendMessageInput,
        generation: &Generation,
        cost: f64,
        receipt: Option<&LedgerReceipt>,
    ) {
        let user_id = input.user_id.as_str();

        best_effort(
            "save user message",
            self.repo
                .save_message(&NewChatMessage::user(user_id, &input.message, &generation.model)),
        )
        .await;

        best_effort(
            "save assistant message",
            self.repo.save_message(&NewChatMessage {
                user_id: user_id.to_string(),
                role: Role::Assistant,
                content: generation.text.clone(),
                model: Some(generation.model.clone()),
                tokens_used: Some(generation.tokens_used),
                cost: Some(cost),
                ledger_transaction_id: receipt.map(|r| r.transaction_id.clone()),
            }),
        )
        .await;

        best_effort("count API call", self.limiter.record_call(user_id)).await;

        if let Some(receipt) = receipt {
            best_effort(
                "save ledger transaction",
                self.repo.save_transaction(&NewLedgerTransaction::chat(
                    user_id,
                    receipt,
                    &generation.model,
                    generation.tokens_used,
                    cost,
                )),
            )
            .await;
        }

        tracing::debug!(user_id, "Chat exchange persisted");
    }
}
