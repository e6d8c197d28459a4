//! Service lifecycle
//!
//! Owns every long-lived collaborator. Built once in `main`, handed to the
//! routers by reference, and shut down after the server stops.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chat::{DisabledNotary, GeminiConfig, GeminiGenerator, PgChatRepository};
use gateway::{PgRateLimitStore, SignedCookieSessions};
use platform::rate_limit::FixedWindowLimiter;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::config::ApiConfig;

pub struct Services {
    pub pool: PgPool,
    pub repo: Arc<PgChatRepository>,
    pub generator: Arc<GeminiGenerator>,
    pub notary: Arc<DisabledNotary>,
    pub limiter: FixedWindowLimiter<PgRateLimitStore>,
    pub sessions: Arc<SignedCookieSessions>,
}

impl Services {
    /// Connect, migrate and build the collaborators
    pub async fn init(config: &ApiConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&config.database_url)
            .await
            .context("Failed to connect to database")?;

        tracing::info!(
            max_connections = config.database_max_connections,
            "Connected to database"
        );

        sqlx::migrate!("../../../database/migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        tracing::info!("Migrations completed");

        let generator = GeminiGenerator::new(GeminiConfig::new(config.genai_api_key.clone()))
            .context("Failed to build the AI client")?;

        if !config.services.ledger {
            tracing::info!("Ledger credentials not set, API calls will not be notarised");
        }

        let mut sessions = SignedCookieSessions::new(config.session_secret);
        if !config.environment.is_production() {
            sessions = sessions.insecure_cookies();
        }

        Ok(Self {
            repo: Arc::new(PgChatRepository::new(pool.clone())),
            generator: Arc::new(generator),
            notary: Arc::new(DisabledNotary),
            limiter: FixedWindowLimiter::new(Arc::new(PgRateLimitStore::new(pool.clone()))),
            sessions: Arc::new(sessions),
            pool,
        })
    }

    /// Close the pool once in-flight requests are done
    pub async fn shutdown(self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }
}
