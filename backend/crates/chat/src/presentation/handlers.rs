//! Route handlers
//!
//! Each handler runs after the route's middleware has set the user and the
//! rate-limit decision on the context.

use std::sync::Arc;

use axum::Json;
use axum::response::{IntoResponse, Response};
use gateway::{PipelineRequest, RequestContext, RouteHandler};
use kernel::error::fault::Fault;
use kernel::response::success;
use platform::rate_limit::RateLimitStore;
use serde_json::Value;

use crate::application::config::ChatConfig;
use crate::application::history::{DeleteHistoryUseCase, ListHistoryUseCase};
use crate::application::ledger::ListTransactionsUseCase;
use crate::application::metrics::MetricsUseCase;
use crate::application::send_message::{SendMessageInput, SendMessageUseCase};
use crate::application::validation::{
    ChatRequest, DeleteParams, HistoryParams, HistoryQuery, TransactionParams, sanitize_user_input,
};
use crate::domain::repository::{
    ChatRepository, DatabaseProbe, LedgerNotary, LedgerRepository, TextGenerator,
};
use crate::presentation::dto::{
    ChatReplyResponse, DeleteResponse, HistoryResponse, LegacyChatResponse, MetricsResponse,
    TransactionsResponse,
};

/// Body layout of a chat reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyShape {
    /// Success envelope with `meta.requestId`
    Envelope,
    /// Bare `{success, data}` body of the first chat route
    Legacy,
}

// ============================================================================
// Send
// ============================================================================

pub struct SendMessageHandler<R, G, N, S>
where
    R: ChatRepository + LedgerRepository,
    G: TextGenerator,
    N: LedgerNotary,
    S: RateLimitStore,
{
    use_case: Arc<SendMessageUseCase<R, G, N, S>>,
    config: Arc<ChatConfig>,
    shape: ReplyShape,
}

impl<R, G, N, S> SendMessageHandler<R, G, N, S>
where
    R: ChatRepository + LedgerRepository,
    G: TextGenerator,
    N: LedgerNotary,
    S: RateLimitStore,
{
    pub fn new(
        use_case: Arc<SendMessageUseCase<R, G, N, S>>,
        config: Arc<ChatConfig>,
        shape: ReplyShape,
    ) -> Self {
        Self {
            use_case,
            config,
            shape,
        }
    }
}

impl<R, G, N, S> RouteHandler for SendMessageHandler<R, G, N, S>
where
    R: ChatRepository + LedgerRepository + Send + Sync,
    G: TextGenerator + Send + Sync,
    N: LedgerNotary + Send + Sync,
    S: RateLimitStore + Send + Sync,
{
    async fn handle(&self, req: &PipelineRequest, ctx: &RequestContext) -> Result<Response, Fault> {
        let body: Value = req.json()?;
        let request = ChatRequest::from_json(&body, &self.config)?;

        let output = self
            .use_case
            .execute(SendMessageInput {
                user_id: ctx.user_id.clone(),
                message: sanitize_user_input(&request.message),
                history: request.history,
            })
            .await?;

        let remaining = ctx.rate_limit.map(|decision| decision.remaining).unwrap_or(0);
        Ok(match self.shape {
            ReplyShape::Envelope => success(ChatReplyResponse::new(output, remaining))
                .with_meta("requestId", ctx.request_id.as_str())
                .into_response(),
            ReplyShape::Legacy => Json(LegacyChatResponse::new(output, remaining)).into_response(),
        })
    }
}

// ============================================================================
// History
// ============================================================================

pub struct ListHistoryHandler<R>
where
    R: ChatRepository,
{
    use_case: ListHistoryUseCase<R>,
    config: Arc<ChatConfig>,
}

impl<R> ListHistoryHandler<R>
where
    R: ChatRepository + Send + Sync,
{
    pub fn new(repo: Arc<R>, config: Arc<ChatConfig>) -> Self {
        Self {
            use_case: ListHistoryUseCase::new(repo),
            config,
        }
    }
}

impl<R> RouteHandler for ListHistoryHandler<R>
where
    R: ChatRepository + Send + Sync,
{
    async fn handle(&self, req: &PipelineRequest, ctx: &RequestContext) -> Result<Response, Fault> {
        let params: HistoryParams = req.query()?;
        let query = HistoryQuery::parse(&params, &self.config)?;

        let page = self.use_case.execute(&ctx.user_id, query).await?;

        Ok(success(HistoryResponse::from(page)).into_response())
    }
}

pub struct DeleteHistoryHandler<R>
where
    R: ChatRepository,
{
    use_case: DeleteHistoryUseCase<R>,
}

impl<R> DeleteHistoryHandler<R>
where
    R: ChatRepository + Send + Sync,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self {
            use_case: DeleteHistoryUseCase::new(repo),
        }
    }
}

impl<R> RouteHandler for DeleteHistoryHandler<R>
where
    R: ChatRepository + Send + Sync,
{
    async fn handle(&self, req: &PipelineRequest, ctx: &RequestContext) -> Result<Response, Fault> {
        let params: DeleteParams = req.query()?;
        let days = params.days()?;

        let outcome = self.use_case.execute(&ctx.user_id, days).await?;

        Ok(success(DeleteResponse::from(outcome)).into_response())
    }
}

// ============================================================================
// Metrics
// ============================================================================

pub struct MetricsHandler<R>
where
    R: ChatRepository + LedgerRepository + DatabaseProbe,
{
    use_case: MetricsUseCase<R>,
}

impl<R> MetricsHandler<R>
where
    R: ChatRepository + LedgerRepository + DatabaseProbe + Send + Sync,
{
    pub fn new(use_case: MetricsUseCase<R>) -> Self {
        Self { use_case }
    }
}

impl<R> RouteHandler for MetricsHandler<R>
where
    R: ChatRepository + LedgerRepository + DatabaseProbe + Send + Sync,
{
    async fn handle(&self, _req: &PipelineRequest, ctx: &RequestContext) -> Result<Response, Fault> {
        let report = self.use_case.execute(&ctx.user_id).await?;
        Ok(success(MetricsResponse::from(report)).into_response())
    }
}

// ============================================================================
// Ledger
// ============================================================================

pub struct ListTransactionsHandler<R>
where
    R: LedgerRepository,
{
    use_case: ListTransactionsUseCase<R>,
    config: Arc<ChatConfig>,
}

impl<R> ListTransactionsHandler<R>
where
    R: LedgerRepository + Send + Sync,
{
    pub fn new(repo: Arc<R>, config: Arc<ChatConfig>) -> Self {
        Self {
            use_case: ListTransactionsUseCase::new(repo),
            config,
        }
    }
}

impl<R> RouteHandler for ListTransactionsHandler<R>
where
    R: LedgerRepository + Send + Sync,
{
    async fn handle(&self, req: &PipelineRequest, ctx: &RequestContext) -> Result<Response, Fault> {
        let params: TransactionParams = req.query()?;
        let limit = params.limit(&self.config)?;

        let page = self.use_case.execute(&ctx.user_id, limit).await?;
        Ok(success(TransactionsResponse::from(page)).into_response())
    }
}
