//! Method check

use async_trait::async_trait;
use axum::http::{HeaderValue, Method, header};
use axum::response::{IntoResponse, Response};
use kernel::error::app_error::AppError;
use kernel::error::fault::Fault;

use crate::domain::context::RequestContext;
use crate::domain::middleware::{Flow, Middleware, PipelineRequest};

/// `405 METHOD_NOT_ALLOWED` envelope with an `Allow` header
pub fn method_not_allowed(method: &Method, allowed: &[Method]) -> Response {
    let list = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    let mut response = AppError::method_not_allowed(format!(
        "Method {method} not allowed. Allowed methods: {list}"
    ))
    .into_response();

    if let Ok(value) = HeaderValue::from_str(&list) {
        response.headers_mut().insert(header::ALLOW, value);
    }
    response
}

/// `methods` with `HEAD` inserted after `GET`, since axum serves HEAD with
/// the GET handler
pub fn with_implied_head(methods: &[Method]) -> Vec<Method> {
    let mut allowed = Vec::with_capacity(methods.len() + 1);
    for method in methods {
        if !allowed.contains(method) {
            allowed.push(method.clone());
        }
        if *method == Method::GET && !methods.contains(&Method::HEAD) {
            allowed.push(Method::HEAD);
        }
    }
    allowed
}

#[derive(Debug, Clone)]
pub struct MethodsMiddleware {
    allowed: Vec<Method>,
}

impl MethodsMiddleware {
    pub fn new(allowed: impl Into<Vec<Method>>) -> Self {
        Self {
            allowed: with_implied_head(&allowed.into()),
        }
    }
}

#[async_trait]
impl Middleware for MethodsMiddleware {
    fn name(&self) -> &'static str {
        "methods"
    }

    async fn call(&self, req: &PipelineRequest, _ctx: &mut RequestContext) -> Result<Flow, Fault> {
        if self.allowed.contains(req.method()) {
            Ok(Flow::Continue)
        } else {
            tracing::debug!(method = %req.method(), path = req.path(), "Method not allowed");
            Ok(Flow::Respond(method_not_allowed(req.method(), &self.allowed)))
        }
    }
}
