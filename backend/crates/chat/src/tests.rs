//! Unit tests for the chat crate

#[cfg(test)]
mod support {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Instant;

    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, Response, header};
    use chrono::{Duration, TimeZone, Utc};
    use gateway::{CorsConfig, SignedCookieSessions};
    use kernel::error::fault::{Cause, Dependency, Fault};
    use platform::config::Environment;
    use platform::rate_limit::{FixedWindowLimiter, InMemoryRateLimitStore};
    use tokio::sync::Mutex;

    use crate::application::config::ChatConfig;
    use crate::domain::entity::{
        ApiCallRecord, ChatMessage, DatabaseHealth, HistoryTurn, LedgerReceipt,
        LedgerTransaction, NewChatMessage, NewLedgerTransaction, Role, TransactionSummary,
        UserStats,
    };
    use crate::domain::repository::{
        ChatRepository, DatabaseProbe, Generation, LedgerNotary, LedgerRepository, TextGenerator,
    };
    use crate::error::{ChatError, ChatResult, LedgerError};
    use crate::presentation::router::ChatRoutes;

    pub const SECRET: [u8; 32] = [7u8; 32];

    /// Store that keeps everything in vectors
    #[derive(Default)]
    pub struct MemoryRepo {
        pub messages: Mutex<Vec<ChatMessage>>,
        pub transactions: Mutex<Vec<LedgerTransaction>>,
        pub failing: AtomicBool,
    }

    impl MemoryRepo {
        fn check(&self) -> ChatResult<()> {
            if self.failing.load(Ordering::SeqCst) {
                Err(ChatError::Database(sqlx::Error::PoolTimedOut))
            } else {
                Ok(())
            }
        }

        /// Insert a message created `age_days` ago
        pub async fn seed(&self, user_id: &str, content: &str, age_days: i64) {
            let mut messages = self.messages.lock().await;
            let id = messages.len() as i64 + 1;
            messages.push(ChatMessage {
                id,
                user_id: user_id.to_string(),
                role: Role::User,
                content: content.to_string(),
                model: None,
                tokens_used: Some(10),
                cost: Some(0.001),
                ledger_transaction_id: None,
                created_at: Utc::now() - Duration::days(age_days),
            });
        }
    }

    impl ChatRepository for MemoryRepo {
        async fn save_message(&self, message: &NewChatMessage) -> ChatResult<ChatMessage> {
            self.check()?;
            let mut messages = self.messages.lock().await;
            let stored = ChatMessage {
                id: messages.len() as i64 + 1,
                user_id: message.user_id.clone(),
                role: message.role,
                content: message.content.clone(),
                model: message.model.clone(),
                tokens_used: message.tokens_used,
                cost: message.cost,
                ledger_transaction_id: message.ledger_transaction_id.clone(),
                created_at: Utc::now(),
            };
            messages.push(stored.clone());
            Ok(stored)
        }

        async fn list_messages(&self, user_id: &str, limit: i64) -> ChatResult<Vec<ChatMessage>> {
            self.check()?;
            let mut mine: Vec<ChatMessage> = self
                .messages
                .lock()
                .await
                .iter()
                .filter(|m| m.user_id == user_id)
                .cloned()
                .collect();
            mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            mine.truncate(limit as usize);
            Ok(mine)
        }

        async fn delete_messages(&self, user_id: &str, days: u32) -> ChatResult<u64> {
            self.check()?;
            let cutoff = Utc::now() - Duration::days(i64::from(days));
            let mut messages = self.messages.lock().await;
            let before = messages.len();
            messages.retain(|m| m.user_id != user_id || (days > 0 && m.created_at >= cutoff));
            Ok((before - messages.len()) as u64)
        }

        async fn user_stats(&self, user_id: &str) -> ChatResult<UserStats> {
            self.check()?;
            let messages = self.messages.lock().await;
            let mine: Vec<&ChatMessage> = messages.iter().filter(|m| m.user_id == user_id).collect();
            Ok(UserStats {
                total_messages: mine.len() as i64,
                total_tokens_used: mine.iter().filter_map(|m| m.tokens_used).map(i64::from).sum(),
                total_cost: mine.iter().filter_map(|m| m.cost).sum(),
                first_message_at: mine.iter().map(|m| m.created_at).min(),
                last_message_at: mine.iter().map(|m| m.created_at).max(),
            })
        }
    }

    impl LedgerRepository for MemoryRepo {
        async fn save_transaction(&self, tx: &NewLedgerTransaction) -> ChatResult<LedgerTransaction> {
            self.check()?;
            let mut transactions = self.transactions.lock().await;
            let stored = LedgerTransaction {
                id: transactions.len() as i64 + 1,
                user_id: tx.user_id.clone(),
                transaction_id: tx.transaction_id.clone(),
                consensus_timestamp: tx.consensus_timestamp,
                status: tx.status.clone(),
                cost: tx.cost,
                carbon_impact: tx.carbon_impact,
                api_call_type: tx.api_call_type.clone(),
                metadata: tx.metadata.clone(),
                created_at: Utc::now(),
            };
            transactions.push(stored.clone());
            Ok(stored)
        }

        async fn list_transactions(&self, user_id: &str, limit: i64) -> ChatResult<Vec<LedgerTransaction>> {
            self.check()?;
            Ok(self
                .transactions
                .lock()
                .await
                .iter()
                .rev()
                .filter(|tx| tx.user_id == user_id)
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn transaction_summary(&self, user_id: &str) -> ChatResult<TransactionSummary> {
            self.check()?;
            let transactions = self.transactions.lock().await;
            let mine: Vec<&LedgerTransaction> =
                transactions.iter().filter(|tx| tx.user_id == user_id).collect();
            Ok(TransactionSummary {
                total_transactions: mine.len() as i64,
                total_cost: mine.iter().map(|tx| tx.cost).sum(),
                total_carbon_saved: mine.iter().map(|tx| tx.carbon_impact).sum::<f64>().abs(),
            })
        }
    }

    impl DatabaseProbe for MemoryRepo {
        async fn probe(&self) -> DatabaseHealth {
            DatabaseHealth {
                connected: !self.failing.load(Ordering::SeqCst),
                response_time: 1,
                active_connections: 2,
            }
        }
    }

    /// Generator that replies with a fixed text, or a fixed fault
    pub struct StubGenerator {
        pub reply: &'static str,
        pub fault: Option<(Cause, &'static str)>,
        pub calls: AtomicUsize,
        pub last_history: Mutex<Vec<HistoryTurn>>,
    }

    impl StubGenerator {
        pub fn replying(reply: &'static str) -> Self {
            Self {
                reply,
                fault: None,
                calls: AtomicUsize::new(0),
                last_history: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(cause: Cause) -> Self {
            Self {
                fault: Some((cause, "provider said no")),
                ..Self::replying("")
            }
        }
    }

    impl TextGenerator for StubGenerator {
        fn model(&self) -> &str {
            "stub-model"
        }

        async fn generate(&self, message: &str, history: &[HistoryTurn]) -> Result<Generation, Fault> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_history.lock().await = history.to_vec();
            if let Some((cause, detail)) = self.fault {
                return Err(Fault::dependency(Dependency::Ai, cause, detail));
            }
            Ok(Generation {
                text: format!("{} ({message})", self.reply),
                tokens_used: 1000,
                model: "stub-model".to_string(),
            })
        }
    }

    /// Notary that always issues the same receipt
    pub struct StubNotary;

    impl LedgerNotary for StubNotary {
        async fn notarize(&self, call: &ApiCallRecord) -> Result<LedgerReceipt, LedgerError> {
            Ok(LedgerReceipt {
                transaction_id: format!("0.0.4242@{}", call.tokens_used),
                consensus_timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
                status: "SUCCESS".to_string(),
                ledger_cost: 0.0001,
                carbon_impact: -0.00002,
            })
        }
    }

    pub struct Harness {
        pub repo: Arc<MemoryRepo>,
        pub generator: Arc<StubGenerator>,
        pub store: Arc<InMemoryRateLimitStore>,
        pub app: Router,
    }

    pub fn harness<N>(generator: StubGenerator, notary: N) -> Harness
    where
        N: LedgerNotary + Send + Sync + 'static,
    {
        let repo = Arc::new(MemoryRepo::default());
        let generator = Arc::new(generator);
        let store = Arc::new(InMemoryRateLimitStore::new());

        let app = ChatRoutes {
            repo: Arc::clone(&repo),
            generator: Arc::clone(&generator),
            notary: Arc::new(notary),
            limiter: FixedWindowLimiter::new(Arc::clone(&store)),
            sessions: Arc::new(SignedCookieSessions::new(SECRET)),
            config: Arc::new(ChatConfig::default()),
            environment: Environment::Production,
            cors: CorsConfig::default(),
            started_at: Instant::now(),
        }
        .router::<()>();

        Harness {
            repo,
            generator,
            store,
            app,
        }
    }

    pub fn session_cookie(user_id: &str) -> String {
        format!("aether_session={}", SignedCookieSessions::new(SECRET).issue(user_id))
    }

    pub fn post_json(uri: &str, body: serde_json::Value, user: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(user) = user {
            builder = builder.header(header::COOKIE, session_cookie(user));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    pub fn request(method: Method, uri: &str, user: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::COOKIE, session_cookie(user));
        }
        builder.body(Body::empty()).unwrap()
    }

    pub async fn json_body(response: Response<Body>) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}

#[cfg(test)]
mod send_tests {
    use std::sync::atomic::Ordering;

    use axum::http::StatusCode;
    use kernel::error::fault::Cause;
    use serde_json::json;
    use tower::ServiceExt;

    use super::support::*;
    use crate::domain::entity::Role;
    use crate::infra::notary::DisabledNotary;

    #[tokio::test]
    async fn test_send_returns_reply_and_persists() {
        let h = harness(StubGenerator::replying("Hi"), StubNotary);

        let response = h
            .app
            .clone()
            .oneshot(post_json(
                "/api/chat/v2",
                json!({ "message": "  <b>Hello</b>   world " }),
                Some("alice"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let data = &body["data"];
        assert_eq!(body["success"], true);
        assert_eq!(data["message"], "Hi (Hello world)");
        assert_eq!(data["model"], "stub-model");
        assert_eq!(data["usage"]["tokensUsed"], 1000);
        let cost = crate::application::config::ChatConfig::default().cost(1000);
        assert_eq!(data["usage"]["cost"], cost);
        assert_eq!(data["usage"]["costFormatted"], format!("${cost:.6}"));
        assert_eq!(data["blockchain"]["status"], "SUCCESS");
        assert_eq!(data["blockchain"]["carbonImpactFormatted"], "0.00g CO₂ saved");
        assert_eq!(
            data["blockchain"]["consensusTimestamp"],
            "2024-05-01T12:00:00.000Z"
        );
        assert_eq!(data["rateLimit"]["remaining"], 99);
        assert!(body["meta"]["requestId"].as_str().unwrap().starts_with("req_"));

        let messages = h.repo.messages.lock().await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "Hello world");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].tokens_used, Some(1000));
        assert_eq!(
            messages[1].ledger_transaction_id.as_deref(),
            Some("0.0.4242@1000")
        );

        let transactions = h.repo.transactions.lock().await;
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].api_call_type, "chat");
        assert_eq!(transactions[0].metadata["model"], "stub-model");

        let record = h.store.record("alice").await.unwrap();
        assert_eq!(record.call_count, 1);
    }

    #[tokio::test]
    async fn test_history_is_forwarded() {
        let h = harness(StubGenerator::replying("ok"), DisabledNotary);

        let response = h
            .app
            .clone()
            .oneshot(post_json(
                "/api/chat/v2",
                json!({
                    "message": "next",
                    "chatHistory": [
                        { "role": "user", "content": "first" },
                        { "role": "assistant", "content": "reply" }
                    ]
                }),
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let history = h.generator.last_history.lock().await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_disabled_ledger_omits_blockchain() {
        let h = harness(StubGenerator::replying("Hi"), DisabledNotary);

        let response = h
            .app
            .clone()
            .oneshot(post_json("/api/chat/v2", json!({ "message": "hey" }), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert!(body["data"].get("blockchain").is_none());
        assert_eq!(h.repo.messages.lock().await[0].user_id, "anonymous");
        assert!(h.repo.transactions.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_does_not_fail_reply() {
        let h = harness(StubGenerator::replying("Hi"), StubNotary);
        h.repo.failing.store(true, Ordering::SeqCst);

        let response = h
            .app
            .clone()
            .oneshot(post_json("/api/chat/v2", json!({ "message": "hey" }), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["data"]["message"], "Hi (hey)");
    }

    #[tokio::test]
    async fn test_invalid_body_is_validation_error() {
        let h = harness(StubGenerator::replying("Hi"), StubNotary);

        let response = h
            .app
            .clone()
            .oneshot(post_json("/api/chat/v2", json!({ "message": "" }), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["details"]["errors"][0]["field"], "message");
        assert_eq!(
            body["error"]["details"]["errors"][0]["message"],
            "Message cannot be empty"
        );
        assert_eq!(h.generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let h = harness(StubGenerator::replying("Hi"), StubNotary);

        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/api/chat/v2")
            .body(axum::body::Body::from("{not json"))
            .unwrap();
        let response = h.app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["message"], "Invalid JSON in request body");
    }

    #[tokio::test]
    async fn test_generator_faults_are_classified() {
        let cases = [
            (Cause::Quota, StatusCode::SERVICE_UNAVAILABLE, "API quota exceeded. Please try again later."),
            (
                Cause::Rejected,
                StatusCode::BAD_REQUEST,
                "Response blocked by safety filters. Please rephrase your query.",
            ),
            (Cause::Failed, StatusCode::INTERNAL_SERVER_ERROR, "AI service error"),
        ];

        for (cause, status, message) in cases {
            let h = harness(StubGenerator::failing(cause), StubNotary);
            let response = h
                .app
                .clone()
                .oneshot(post_json("/api/chat/v2", json!({ "message": "hey" }), None))
                .await
                .unwrap();

            assert_eq!(response.status(), status);
            let body = json_body(response).await;
            assert_eq!(body["error"]["message"], message);
            assert!(!body.to_string().contains("provider said no"));
            assert!(h.repo.messages.lock().await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_legacy_body() {
        let h = harness(StubGenerator::replying("Hi"), DisabledNotary);

        let response = h
            .app
            .clone()
            .oneshot(post_json("/api/chat", json!({ "message": "hey" }), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["response"], "Hi (hey)");
        assert_eq!(body["data"]["tokensUsed"], 1000);
        assert!(body["data"]["hedera"].is_null());
        assert_eq!(body["data"]["rateLimit"]["remaining"], 98);
        assert!(body.get("meta").is_none());
    }

    #[tokio::test]
    async fn test_quota_exhausted() {
        let h = harness(StubGenerator::replying("Hi"), StubNotary);
        h.store
            .seed(platform::rate_limit::RateLimitRecord {
                user_id: "bob".into(),
                call_count: 100,
                window_reset_at_ms: Some(chrono::Utc::now().timestamp_millis() + 60_000),
            })
            .await;

        let response = h
            .app
            .clone()
            .oneshot(post_json("/api/chat/v2", json!({ "message": "hey" }), Some("bob")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["retry-after"], "900");
        assert_eq!(h.generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_put_is_not_allowed() {
        let h = harness(StubGenerator::replying("Hi"), StubNotary);

        let response = h
            .app
            .clone()
            .oneshot(request(axum::http::Method::PUT, "/api/chat/v2", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body = json_body(response).await;
        assert_eq!(
            body["error"]["message"],
            "Method PUT not allowed. Allowed methods: POST, GET, HEAD, DELETE"
        );
    }
}

#[cfg(test)]
mod history_tests {
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;

    use super::support::*;
    use crate::infra::notary::DisabledNotary;

    #[tokio::test]
    async fn test_history_requires_session() {
        let h = harness(StubGenerator::replying("Hi"), DisabledNotary);

        let response = h
            .app
            .clone()
            .oneshot(request(Method::GET, "/api/chat/v2", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_history_page() {
        let h = harness(StubGenerator::replying("Hi"), DisabledNotary);
        h.repo.seed("carol", "old", 10).await;
        h.repo.seed("carol", "new", 1).await;
        h.repo.seed("dave", "other", 1).await;

        let response = h
            .app
            .clone()
            .oneshot(request(Method::GET, "/api/chat/v2?limit=2", Some("carol")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let data = &body["data"];
        assert_eq!(data["messages"].as_array().unwrap().len(), 2);
        assert_eq!(data["messages"][0]["content"], "new");
        assert_eq!(data["stats"]["totalMessages"], 2);
        assert_eq!(data["stats"]["totalTokensUsed"], 20);
        assert_eq!(data["stats"]["avgCostPerMessage"], "0.001000");
        assert_eq!(data["pagination"]["limit"], 2);
        assert_eq!(data["pagination"]["returned"], 2);
        assert_eq!(data["pagination"]["hasMore"], true);
    }

    #[tokio::test]
    async fn test_history_before_filter() {
        let h = harness(StubGenerator::replying("Hi"), DisabledNotary);
        h.repo.seed("carol", "old", 10).await;
        h.repo.seed("carol", "new", 1).await;

        let before = (chrono::Utc::now() - chrono::Duration::days(5))
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        let uri = format!("/api/chat/v2?before={before}");
        let response = h
            .app
            .clone()
            .oneshot(request(Method::GET, &uri, Some("carol")))
            .await
            .unwrap();

        let body = json_body(response).await;
        let data = &body["data"];
        assert_eq!(data["messages"].as_array().unwrap().len(), 1);
        assert_eq!(data["messages"][0]["content"], "old");
        assert_eq!(data["pagination"]["returned"], 1);
        assert_eq!(data["pagination"]["hasMore"], false);
    }

    #[tokio::test]
    async fn test_history_rejects_bad_params() {
        let h = harness(StubGenerator::replying("Hi"), DisabledNotary);

        let cases = [
            ("/api/chat/v2?limit=0", "Limit must be between 1 and 100"),
            ("/api/chat/v2?limit=101", "Limit must be between 1 and 100"),
            (
                "/api/chat/v2?before=not-a-date",
                "Invalid date format for \"before\" parameter",
            ),
        ];
        for (uri, message) in cases {
            let response = h
                .app
                .clone()
                .oneshot(request(Method::GET, uri, Some("carol")))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let body = json_body(response).await;
            assert_eq!(body["error"]["code"], "BAD_REQUEST");
            assert_eq!(body["error"]["message"], message);
        }
    }

    #[tokio::test]
    async fn test_delete_history() {
        let h = harness(StubGenerator::replying("Hi"), DisabledNotary);
        h.repo.seed("erin", "old", 10).await;
        h.repo.seed("erin", "new", 1).await;
        h.repo.seed("frank", "keep", 30).await;

        let response = h
            .app
            .clone()
            .oneshot(request(Method::DELETE, "/api/chat/v2?days=5", Some("erin")))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["data"]["deleted"], 1);
        assert_eq!(body["data"]["message"], "Deleted 1 messages older than 5 days");

        let response = h
            .app
            .clone()
            .oneshot(request(Method::DELETE, "/api/chat/v2", Some("erin")))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["data"]["message"], "Deleted all 1 messages");

        assert_eq!(h.repo.messages.lock().await.len(), 1);

        let response = h
            .app
            .clone()
            .oneshot(request(Method::DELETE, "/api/chat/v2?days=-1", Some("erin")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["message"], "Days must be a non-negative number");
    }
}

#[cfg(test)]
mod metrics_tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use super::support::*;

    #[tokio::test]
    async fn test_metrics_report() {
        let h = harness(StubGenerator::replying("Hi"), StubNotary);

        let response = h
            .app
            .clone()
            .oneshot(post_json("/api/chat/v2", json!({ "message": "hey" }), Some("gina")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = h
            .app
            .clone()
            .oneshot(request(Method::GET, "/api/metrics", Some("gina")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let data = &body["data"];
        assert_eq!(data["user"]["id"], "gina");
        assert_eq!(data["user"]["stats"]["totalMessages"], 2);
        assert_eq!(data["user"]["stats"]["avgTokensPerMessage"], 500);
        assert!(data["user"]["stats"]["firstMessageAt"].is_string());
        assert_eq!(data["blockchain"]["totalTransactions"], 1);
        assert_eq!(
            data["blockchain"]["recentTransactions"][0]["id"],
            "0.0.4242@1000"
        );
        assert_eq!(data["blockchain"]["recentTransactions"][0]["apiCallType"], "chat");
        assert_eq!(data["system"]["database"]["connected"], true);
        assert_eq!(data["system"]["database"]["activeConnections"], 2);
        assert!(data["system"]["uptime"].is_number());
    }

    #[tokio::test]
    async fn test_metrics_for_new_user() {
        let h = harness(StubGenerator::replying("Hi"), StubNotary);

        let response = h
            .app
            .clone()
            .oneshot(request(Method::GET, "/api/metrics", Some("hank")))
            .await
            .unwrap();

        let body = json_body(response).await;
        let stats = &body["data"]["user"]["stats"];
        assert_eq!(stats["avgCostPerMessage"], "0.000000");
        assert!(stats["lastMessageAt"].is_null());
        assert_eq!(body["data"]["blockchain"]["totalCarbonSaved"], 0.0);
    }
}

#[cfg(test)]
mod ledger_tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use super::support::*;

    #[tokio::test]
    async fn test_transactions_require_session() {
        let h = harness(StubGenerator::replying("Hi"), StubNotary);

        let response = h
            .app
            .clone()
            .oneshot(request(Method::GET, "/api/hedera/transactions", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_transactions_listing() {
        let h = harness(StubGenerator::replying("Hi"), StubNotary);
        for message in ["one", "two"] {
            let response = h
                .app
                .clone()
                .oneshot(post_json("/api/chat/v2", json!({ "message": message }), Some("ivy")))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = h
            .app
            .clone()
            .oneshot(request(Method::GET, "/api/hedera/transactions?limit=1", Some("ivy")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let data = &body["data"];
        assert_eq!(data["transactions"].as_array().unwrap().len(), 1);
        assert_eq!(data["transactions"][0]["id"], 2);
        assert_eq!(data["transactions"][0]["apiCallType"], "chat");
        assert_eq!(data["transactions"][0]["metadata"]["tokensUsed"], 1000);
        assert_eq!(data["summary"]["totalTransactions"], 2);

        let response = h
            .app
            .clone()
            .oneshot(request(Method::GET, "/api/hedera/transactions?limit=0", Some("ivy")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
