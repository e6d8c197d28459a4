//! Route assembly
//!
//! A [`Route`] is one pipeline plus its error-disclosure policy. The builder
//! fixes step order regardless of the order options are set:
//! logging, CORS, method check, auth, rate limit, handler.

use std::sync::Arc;

use axum::http::Method;
use platform::config::Environment;
use platform::rate_limit::{FixedWindowLimiter, RateLimitConfig, RateLimitStore};

use crate::application::pipeline::Pipeline;
use crate::domain::middleware::Middleware;
use crate::domain::repository::{RouteHandler, SessionProvider};
use crate::presentation::middleware::HandlerStep;
use crate::presentation::middleware::auth::AuthMiddleware;
use crate::presentation::middleware::cors::{CorsConfig, CorsMiddleware};
use crate::presentation::middleware::logging::LoggingMiddleware;
use crate::presentation::middleware::methods::MethodsMiddleware;
use crate::presentation::middleware::rate_limit::RateLimitMiddleware;

#[derive(Debug)]
pub struct Route {
    name: &'static str,
    pipeline: Pipeline,
    environment: Environment,
}

impl Route {
    pub fn builder() -> RouteBuilder {
        RouteBuilder::default()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }
}

#[derive(Default)]
pub struct RouteBuilder {
    name: Option<&'static str>,
    environment: Environment,
    cors: Option<CorsConfig>,
    methods: Option<Vec<Method>>,
    auth: Option<Arc<dyn Middleware>>,
    rate_limit: Option<Arc<dyn Middleware>>,
    handler: Option<Arc<dyn Middleware>>,
}

impl RouteBuilder {
    /// Label used in logs
    pub fn name(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    /// Controls error disclosure at the boundary
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn cors(mut self, config: CorsConfig) -> Self {
        self.cors = Some(config);
        self
    }

    pub fn methods(mut self, methods: impl Into<Vec<Method>>) -> Self {
        self.methods = Some(methods.into());
        self
    }

    pub fn require_auth<P>(mut self, provider: Arc<P>) -> Self
    where
        P: SessionProvider + Send + Sync + 'static,
    {
        self.auth = Some(Arc::new(AuthMiddleware::required(provider)));
        self
    }

    pub fn optional_auth<P>(mut self, provider: Arc<P>) -> Self
    where
        P: SessionProvider + Send + Sync + 'static,
    {
        self.auth = Some(Arc::new(AuthMiddleware::optional(provider)));
        self
    }

    pub fn rate_limit<S>(mut self, limiter: FixedWindowLimiter<S>, config: RateLimitConfig) -> Self
    where
        S: RateLimitStore + Send + Sync + 'static,
    {
        self.rate_limit = Some(Arc::new(RateLimitMiddleware::new(limiter, config)));
        self
    }

    pub fn handler<H>(mut self, handler: H) -> Self
    where
        H: RouteHandler + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(HandlerStep::new(handler)));
        self
    }

    pub fn build(self) -> Route {
        let mut pipeline = Pipeline::new().with(LoggingMiddleware);

        if let Some(cors) = &self.cors {
            pipeline.push(Arc::new(CorsMiddleware::new(cors)));
        }
        if let Some(methods) = self.methods {
            pipeline.push(Arc::new(MethodsMiddleware::new(methods)));
        }
        for step in [self.auth, self.rate_limit, self.handler].into_iter().flatten() {
            pipeline.push(step);
        }

        Route {
            name: self.name.unwrap_or("route"),
            pipeline,
            environment: self.environment,
        }
    }
}
