//! Error Boundary
//!
//! Entry point for every routed request. Buffers the body, runs the route's
//! pipeline, and renders any [`Fault`] as an error envelope.

use axum::body::{Body, to_bytes};
use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use kernel::error::fault::Fault;

use crate::domain::context::RequestContext;
use crate::domain::middleware::PipelineRequest;
use crate::presentation::route::Route;

/// Largest request body the pipeline buffers
pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Run `route` for `req` and always produce a response
pub async fn serve(route: &Route, req: Request<Body>) -> Response {
    let (parts, body) = req.into_parts();
    let method = parts.method.clone();
    let path = parts.uri.path().to_owned();

    let mut ctx = RequestContext::new();

    let result = match to_bytes(body, BODY_LIMIT_BYTES).await {
        Ok(bytes) => {
            let req = PipelineRequest::new(parts, bytes);
            route.pipeline().execute(&req, &mut ctx).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to read request body");
            Err(Fault::bad_request("Unable to read request body"))
        }
    };

    let mut response = match result {
        Ok(response) => {
            tracing::info!(
                route = route.name(),
                method = %method,
                path = %path,
                status = response.status().as_u16(),
                duration_ms = ctx.elapsed_ms(),
                request_id = %ctx.request_id,
                "API response"
            );
            response
        }
        Err(fault) => {
            let kind = fault.kind();
            if kind.is_server_error() {
                tracing::error!(
                    route = route.name(),
                    method = %method,
                    path = %path,
                    error = %fault,
                    code = kind.code(),
                    duration_ms = ctx.elapsed_ms(),
                    request_id = %ctx.request_id,
                    "API route error"
                );
            } else {
                tracing::warn!(
                    route = route.name(),
                    method = %method,
                    path = %path,
                    error = %fault,
                    code = kind.code(),
                    duration_ms = ctx.elapsed_ms(),
                    request_id = %ctx.request_id,
                    "API route error"
                );
            }

            let disclose = route.environment().discloses_errors();
            let mut response = fault.into_app_error(disclose).into_response();
            if let Some(cors) = &ctx.cors_headers {
                cors.apply(response.headers_mut());
            }
            response
        }
    };

    if let Ok(value) = HeaderValue::from_str(ctx.request_id.as_str()) {
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER, value);
    }
    response
}
