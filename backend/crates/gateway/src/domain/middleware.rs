//! Middleware contract
//!
//! A middleware inspects the request, may update the [`RequestContext`], and
//! either lets the pipeline continue or ends it with a response.

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::Query;
use axum::http::{HeaderMap, Method, Request, Uri, request::Parts};
use axum::response::Response;
use kernel::error::fault::Fault;
use serde::de::DeserializeOwned;

use crate::domain::context::RequestContext;

/// Outcome of one middleware step
#[must_use = "a Flow::Respond must be returned to the caller"]
#[derive(Debug)]
pub enum Flow {
    Continue,
    /// Terminal response; later steps never run
    Respond(Response),
}

/// Request as seen by the pipeline, with the body already buffered
#[derive(Debug)]
pub struct PipelineRequest {
    parts: Parts,
    body: Bytes,
}

impl PipelineRequest {
    pub fn new(parts: Parts, body: Bytes) -> Self {
        Self { parts, body }
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Deserialize the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Fault> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Deserialize the query string
    pub fn query<T: DeserializeOwned>(&self) -> Result<T, Fault> {
        Query::try_from_uri(&self.parts.uri)
            .map(|Query(value)| value)
            .map_err(|rejection| Fault::bad_request(rejection.body_text()))
    }
}

impl From<Request<Bytes>> for PipelineRequest {
    fn from(req: Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self::new(parts, body)
    }
}

/// One step of a pipeline
///
/// Expected outcomes (denials, preflights) are `Ok(Flow::Respond(..))`.
/// `Err` is reserved for unexpected faults, which the error boundary renders.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    async fn call(&self, req: &PipelineRequest, ctx: &mut RequestContext) -> Result<Flow, Fault>;
}
