//! Axum adapter
//!
//! Mounts [`Route`]s on axum method routers. Each HTTP method of a path may
//! have its own route; unmatched methods get the 405 envelope. Preflight
//! `OPTIONS` requests go to the first mounted route, whose CORS step answers
//! them.

use std::pin::Pin;
use std::sync::Arc;

use axum::extract::Request;
use axum::http::Method;
use axum::response::Response;
use axum::routing::{MethodFilter, MethodRouter, any, on};

use crate::presentation::boundary;
use crate::presentation::middleware::methods::{method_not_allowed, with_implied_head};
use crate::presentation::route::Route;

/// Serve `route` for every method
pub fn any_route<S>(route: Route) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    any(serve_with(Arc::new(route)))
}

/// Per-path set of routes keyed by method
pub struct Endpoint<S = ()> {
    router: Option<MethodRouter<S>>,
    allowed: Vec<Method>,
    preflight: Option<Arc<Route>>,
}

impl<S> Default for Endpoint<S> {
    fn default() -> Self {
        Self {
            router: None,
            allowed: Vec::new(),
            preflight: None,
        }
    }
}

impl<S> Endpoint<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `route` for each of `methods`
    pub fn on(mut self, methods: &[Method], route: Route) -> Self {
        let Some(filter) = methods
            .iter()
            .filter_map(|method| MethodFilter::try_from(method.clone()).ok())
            .reduce(MethodFilter::or)
        else {
            tracing::warn!(route = route.name(), "Route mounted without routable methods");
            return self;
        };

        let route = Arc::new(route);
        if self.preflight.is_none() {
            self.preflight = Some(Arc::clone(&route));
        }
        let handler = serve_with(route);

        self.router = Some(match self.router.take() {
            Some(router) => router.on(filter, handler),
            None => on(filter, handler),
        });
        for method in with_implied_head(methods) {
            if !self.allowed.contains(&method) {
                self.allowed.push(method);
            }
        }
        self
    }

    pub fn into_method_router(self) -> MethodRouter<S> {
        let allowed = self.allowed;
        let answers_options = allowed.contains(&Method::OPTIONS);
        let fallback = move |req: Request| {
            let allowed = allowed.clone();
            async move { method_not_allowed(req.method(), &allowed) }
        };

        let Some(mut router) = self.router else {
            return any(fallback);
        };
        if let Some(route) = self.preflight.filter(|_| !answers_options) {
            router = router.options(serve_with(route));
        }
        router.fallback(fallback)
    }
}

type ServeFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

fn serve_with(route: Arc<Route>) -> impl Fn(Request) -> ServeFuture + Clone + Send + Sync + 'static {
    move |req: Request| -> ServeFuture {
        let route = Arc::clone(&route);
        Box::pin(async move { boundary::serve(&route, req).await })
    }
}
