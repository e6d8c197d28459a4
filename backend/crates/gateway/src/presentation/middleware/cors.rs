//! CORS
//!
//! Answers preflights directly and records the CORS headers for everything
//! else, so the composer can copy them onto the final response.

use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use kernel::error::fault::Fault;

use crate::domain::context::{CorsHeaders, RequestContext};
use crate::domain::middleware::{Flow, Middleware, PipelineRequest};
use crate::error::RouteError;

/// Preflight cache lifetime (`Access-Control-Max-Age`)
pub const PREFLIGHT_MAX_AGE_SECS: u32 = 86_400;

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub origin: HeaderValue,
    pub methods: Vec<Method>,
    pub headers: Vec<HeaderName>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origin: HeaderValue::from_static("*"),
            methods: vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ],
            headers: vec![header::CONTENT_TYPE, header::AUTHORIZATION],
        }
    }
}

impl CorsConfig {
    /// Default policy restricted to one origin
    pub fn with_origin(origin: &str) -> Result<Self, RouteError> {
        let origin = HeaderValue::from_str(origin)
            .map_err(|_| RouteError::InvalidOrigin(origin.to_string()))?;
        Ok(Self {
            origin,
            ..Self::default()
        })
    }

    pub fn cors_headers(&self) -> CorsHeaders {
        CorsHeaders {
            allow_origin: self.origin.clone(),
            allow_methods: join_header(self.methods.iter().map(Method::as_str)),
            allow_headers: join_header(self.headers.iter().map(HeaderName::as_str)),
        }
    }
}

fn join_header<'a>(values: impl Iterator<Item = &'a str>) -> HeaderValue {
    let joined = values.collect::<Vec<_>>().join(", ");
    // Method and header names are valid header-value characters.
    HeaderValue::from_str(&joined).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// `204 No Content` preflight answer
pub fn preflight_response(cors: &CorsHeaders) -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    let headers = response.headers_mut();
    cors.apply(headers);
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from(PREFLIGHT_MAX_AGE_SECS),
    );
    response
}

#[derive(Debug, Clone)]
pub struct CorsMiddleware {
    headers: CorsHeaders,
}

impl CorsMiddleware {
    pub fn new(config: &CorsConfig) -> Self {
        Self {
            headers: config.cors_headers(),
        }
    }
}

#[async_trait]
impl Middleware for CorsMiddleware {
    fn name(&self) -> &'static str {
        "cors"
    }

    async fn call(&self, req: &PipelineRequest, ctx: &mut RequestContext) -> Result<Flow, Fault> {
        if req.method() == Method::OPTIONS {
            return Ok(Flow::Respond(preflight_response(&self.headers)));
        }

        ctx.cors_headers = Some(self.headers.clone());
        Ok(Flow::Continue)
    }
}
