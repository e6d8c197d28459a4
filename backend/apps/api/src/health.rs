//! Health check
//!
//! `GET|HEAD /api/health`. The body is a bare health document rather than a
//! success envelope, because probes and uptime monitors read it directly.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use chat::domain::repository::DatabaseProbe;
use chrono::{SecondsFormat, Utc};
use gateway::{CorsConfig, Endpoint, PipelineRequest, RequestContext, Route, RouteHandler};
use kernel::error::fault::Fault;
use platform::config::{Environment, ServiceFlags};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: String,
    /// Seconds since startup
    pub uptime: f64,
    pub response_time: String,
    pub services: ServiceFlags,
    pub database: DatabaseStatus,
    pub environment: EnvironmentInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStatus {
    pub connected: bool,
    pub response_time: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentInfo {
    pub node_env: &'static str,
    pub is_production: bool,
}

pub struct HealthHandler<D> {
    probe: Arc<D>,
    services: ServiceFlags,
    environment: Environment,
    started_at: Instant,
}

impl<D> HealthHandler<D>
where
    D: DatabaseProbe + Send + Sync,
{
    pub fn new(probe: Arc<D>, services: ServiceFlags, environment: Environment, started_at: Instant) -> Self {
        Self {
            probe,
            services,
            environment,
            started_at,
        }
    }

    pub async fn report(&self) -> HealthReport {
        let started = Instant::now();
        let database = self.probe.probe().await;

        let services = ServiceFlags {
            database: database.connected,
            ..self.services
        };
        let warnings = services
            .missing()
            .into_iter()
            .map(|name| format!("Service '{name}' is not configured"))
            .collect();

        HealthReport {
            status: if database.connected { "healthy" } else { "unhealthy" },
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            uptime: self.started_at.elapsed().as_secs_f64(),
            response_time: format!("{}ms", started.elapsed().as_millis()),
            services,
            database: DatabaseStatus {
                connected: database.connected,
                response_time: format!("{}ms", database.response_time),
            },
            environment: EnvironmentInfo {
                node_env: self.environment.as_str(),
                is_production: self.environment.is_production(),
            },
            warnings,
        }
    }
}

impl<D> RouteHandler for HealthHandler<D>
where
    D: DatabaseProbe + Send + Sync,
{
    async fn handle(&self, req: &PipelineRequest, _ctx: &RequestContext) -> Result<Response, Fault> {
        // Liveness only
        if *req.method() == Method::HEAD {
            return Ok(StatusCode::OK.into_response());
        }

        let report = self.report().await;
        let status = if report.database.connected {
            StatusCode::OK
        } else {
            tracing::warn!("Health check failed: database unreachable");
            StatusCode::SERVICE_UNAVAILABLE
        };
        Ok((status, Json(report)).into_response())
    }
}

pub fn router<D, S>(handler: HealthHandler<D>, environment: Environment, cors: CorsConfig) -> Router<S>
where
    D: DatabaseProbe + Send + Sync + 'static,
    S: Clone + Send + Sync + 'static,
{
    let route = Route::builder()
        .name("health")
        .environment(environment)
        .cors(cors)
        .methods([Method::GET, Method::HEAD])
        .handler(handler)
        .build();

    Router::new().route(
        "/api/health",
        Endpoint::new()
            .on(&[Method::GET, Method::HEAD], route)
            .into_method_router(),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use chat::domain::entity::DatabaseHealth;
    use tower::ServiceExt;

    use super::*;

    struct FakeProbe {
        connected: AtomicBool,
    }

    impl DatabaseProbe for FakeProbe {
        async fn probe(&self) -> DatabaseHealth {
            DatabaseHealth {
                connected: self.connected.load(Ordering::SeqCst),
                response_time: 3,
                active_connections: 1,
            }
        }
    }

    fn app(connected: bool, services: ServiceFlags) -> Router {
        let probe = Arc::new(FakeProbe {
            connected: AtomicBool::new(connected),
        });
        let handler = HealthHandler::new(probe, services, Environment::Production, Instant::now());
        router(handler, Environment::Production, CorsConfig::default())
    }

    fn all_configured() -> ServiceFlags {
        ServiceFlags {
            database: true,
            ai: true,
            auth: true,
            ledger: true,
            blob: true,
        }
    }

    async fn get(app: Router, method: Method) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_healthy() {
        let (status, body) = get(app(true, all_configured()), Method::GET).await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["database"]["connected"], true);
        assert_eq!(json["database"]["responseTime"], "3ms");
        assert_eq!(json["environment"]["nodeEnv"], "production");
        assert_eq!(json["environment"]["isProduction"], true);
        assert!(json["responseTime"].as_str().unwrap().ends_with("ms"));
        assert!(json.get("warnings").is_none());
        assert!(json.get("success").is_none());
    }

    #[tokio::test]
    async fn test_unreachable_database() {
        let (status, body) = get(app(false, all_configured()), Method::GET).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "unhealthy");
        assert_eq!(json["services"]["database"], false);
        assert_eq!(json["warnings"][0], "Service 'database' is not configured");
    }

    #[tokio::test]
    async fn test_unconfigured_services_warn() {
        let services = ServiceFlags {
            ledger: false,
            blob: false,
            ..all_configured()
        };
        let (status, body) = get(app(true, services), Method::GET).await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["services"]["ledger"], false);
        assert_eq!(
            json["warnings"],
            serde_json::json!([
                "Service 'ledger' is not configured",
                "Service 'blob' is not configured"
            ])
        );
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let (status, body) = get(app(false, all_configured()), Method::HEAD).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_post_is_not_allowed() {
        let (status, _) = get(app(true, all_configured()), Method::POST).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
}
