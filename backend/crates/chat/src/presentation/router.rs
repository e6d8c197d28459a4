//! Chat Router
//!
//! Mounts the chat, history and metrics routes.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::http::Method;
use gateway::{CorsConfig, Endpoint, Route, RouteBuilder, SessionProvider};
use platform::config::Environment;
use platform::rate_limit::{FixedWindowLimiter, RateLimitStore};

use crate::application::config::ChatConfig;
use crate::application::metrics::MetricsUseCase;
use crate::application::send_message::SendMessageUseCase;
use crate::domain::repository::{
    ChatRepository, DatabaseProbe, LedgerNotary, LedgerRepository, TextGenerator,
};
use crate::presentation::handlers::{
    DeleteHistoryHandler, ListHistoryHandler, ListTransactionsHandler, MetricsHandler, ReplyShape,
    SendMessageHandler,
};

/// Collaborators and settings shared by the chat routes
pub struct ChatRoutes<R, G, N, S, P> {
    pub repo: Arc<R>,
    pub generator: Arc<G>,
    pub notary: Arc<N>,
    pub limiter: FixedWindowLimiter<S>,
    pub sessions: Arc<P>,
    pub config: Arc<ChatConfig>,
    pub environment: Environment,
    pub cors: CorsConfig,
    pub started_at: Instant,
}

impl<R, G, N, S, P> ChatRoutes<R, G, N, S, P>
where
    R: ChatRepository + LedgerRepository + DatabaseProbe + Send + Sync + 'static,
    G: TextGenerator + Send + Sync + 'static,
    N: LedgerNotary + Send + Sync + 'static,
    S: RateLimitStore + Send + Sync + 'static,
    P: SessionProvider + Send + Sync + 'static,
{
    /// `/api/chat`, `/api/chat/v2`, `/api/metrics` and `/api/hedera/transactions`
    pub fn router<St>(self) -> Router<St>
    where
        St: Clone + Send + Sync + 'static,
    {
        let send = Arc::new(SendMessageUseCase::new(
            Arc::clone(&self.repo),
            Arc::clone(&self.generator),
            Arc::clone(&self.notary),
            self.limiter.clone(),
            Arc::clone(&self.config),
        ));

        let legacy = Endpoint::new().on(
            &[Method::POST],
            self.send_route("chat", &send, ReplyShape::Legacy),
        );

        let v2 = Endpoint::new()
            .on(
                &[Method::POST],
                self.send_route("chat.v2.send", &send, ReplyShape::Envelope),
            )
            .on(
                &[Method::GET],
                self.base("chat.v2.history", Method::GET)
                    .require_auth(Arc::clone(&self.sessions))
                    .handler(ListHistoryHandler::new(
                        Arc::clone(&self.repo),
                        Arc::clone(&self.config),
                    ))
                    .build(),
            )
            .on(
                &[Method::DELETE],
                self.base("chat.v2.delete", Method::DELETE)
                    .require_auth(Arc::clone(&self.sessions))
                    .handler(DeleteHistoryHandler::new(Arc::clone(&self.repo)))
                    .build(),
            );

        let metrics = Endpoint::new().on(
            &[Method::GET],
            self.base("metrics", Method::GET)
                .require_auth(Arc::clone(&self.sessions))
                .handler(MetricsHandler::new(MetricsUseCase::new(
                    Arc::clone(&self.repo),
                    Arc::clone(&self.config),
                    self.started_at,
                )))
                .build(),
        );

        let transactions = Endpoint::new().on(
            &[Method::GET],
            self.base("ledger.transactions", Method::GET)
                .require_auth(Arc::clone(&self.sessions))
                .handler(ListTransactionsHandler::new(
                    Arc::clone(&self.repo),
                    Arc::clone(&self.config),
                ))
                .build(),
        );

        Router::new()
            .route("/api/chat", legacy.into_method_router())
            .route("/api/chat/v2", v2.into_method_router())
            .route("/api/metrics", metrics.into_method_router())
            .route("/api/hedera/transactions", transactions.into_method_router())
    }

    fn base(&self, name: &'static str, method: Method) -> RouteBuilder {
        Route::builder()
            .name(name)
            .environment(self.environment)
            .cors(self.cors.clone())
            .methods([method])
    }

    fn send_route(
        &self,
        name: &'static str,
        use_case: &Arc<SendMessageUseCase<R, G, N, S>>,
        shape: ReplyShape,
    ) -> Route {
        self.base(name, Method::POST)
            .optional_auth(Arc::clone(&self.sessions))
            .rate_limit(self.limiter.clone(), self.config.rate_limit)
            .handler(SendMessageHandler::new(
                Arc::clone(use_case),
                Arc::clone(&self.config),
                shape,
            ))
            .build()
    }
}
