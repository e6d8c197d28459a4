//! API Server Entry Point
//!
//! Loads configuration, starts the services, and serves the chat, metrics and
//! health routes. Uses `anyhow` for startup errors; request-level failures are
//! `kernel::error::fault::Fault`s rendered by the gateway boundary.

mod config;
mod health;
mod services;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use chat::{ChatConfig, ChatRoutes};
use gateway::CorsConfig;
use platform::config::Environment;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ApiConfig;
use crate::health::HealthHandler;
use crate::services::Services;

const DEFAULT_LOG_FILTER: &str = "api=info,gateway=info,chat=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    init_tracing(Environment::from_env()?);

    let config = ApiConfig::from_env()?;
    let started_at = Instant::now();

    let services = Services::init(&config).await?;
    let app = build_router(&config, &services, started_at)?;

    tracing::info!(
        addr = %config.bind_addr,
        environment = %config.environment,
        "Listening"
    );

    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    services.shutdown().await;
    tracing::info!("Server stopped");

    Ok(())
}

/// JSON lines in production, human-readable otherwise
fn init_tracing(environment: Environment) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    if environment.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn build_router(config: &ApiConfig, services: &Services, started_at: Instant) -> anyhow::Result<Router> {
    let cors = match &config.cors_origin {
        Some(origin) => CorsConfig::with_origin(origin)?,
        None => CorsConfig::default(),
    };

    let chat = ChatRoutes {
        repo: Arc::clone(&services.repo),
        generator: Arc::clone(&services.generator),
        notary: Arc::clone(&services.notary),
        limiter: services.limiter.clone(),
        sessions: Arc::clone(&services.sessions),
        config: Arc::new(ChatConfig::default()),
        environment: config.environment,
        cors: cors.clone(),
        started_at,
    };

    let health = HealthHandler::new(
        Arc::clone(&services.repo),
        config.services,
        config.environment,
        started_at,
    );

    Ok(Router::new()
        .merge(chat.router())
        .merge(health::router(health, config.environment, cors))
        .layer(TraceLayer::new_for_http()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
