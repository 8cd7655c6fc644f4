//! Per-request dispatch: pick a peer, track the connection, report the outcome.
//!
//! # Responsibilities
//! - Select a backend once per request and rewrite the request target
//! - Hold the backend's connection count for exactly the request's lifetime
//! - Demote a backend that refuses the connection
//!
//! # Design Decisions
//! - The selected backend travels in an explicit `DispatchContext`, never
//!   re-selected when reporting the outcome
//! - The context owns a connection guard; the count drops when the response
//!   body is finished or abandoned, or when the forward fails

use std::error::Error as StdError;
use std::str::FromStr;
use std::sync::Arc;
use axum::body::Body;
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{header, HeaderValue, Request, Response, StatusCode, Uri, Version};
use axum::response::IntoResponse;
use futures_util::StreamExt;
use thiserror::Error;
use url::{Position, Url};

use crate::health::passive;
use crate::load_balancer::{BackendPool, BackendConnectionGuard, Strategy, backend::Backend};

/// Why a request could not be served by a backend.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// Pool empty or nothing alive. The request must not be forwarded.
    #[error("no backends available")]
    NoPeer,
    /// The forward failed at the transport level.
    #[error("upstream request failed")]
    Upstream { refused: bool },
    /// The backend address could not be turned into a request target.
    #[error("invalid backend target `{0}`")]
    Target(String),
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::NoPeer => StatusCode::SERVICE_UNAVAILABLE,
            DispatchError::Upstream { .. } | DispatchError::Target(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> axum::response::Response {
        (self.status(), self.to_string()).into_response()
    }
}

/// Bridges inbound requests to the backend pool.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    pool: Arc<BackendPool>,
    strategy: Strategy,
}

impl Dispatcher {
    pub fn new(pool: Arc<BackendPool>, strategy: Strategy) -> Self {
        Self { pool, strategy }
    }

    pub fn pool(&self) -> &Arc<BackendPool> {
        &self.pool
    }

    /// Select a peer, count the connection and point `request` at it.
    pub fn begin(&self, request: &mut Request<Body>) -> Result<DispatchContext, DispatchError> {
        let guard = self.pool.acquire(self.strategy).ok_or(DispatchError::NoPeer)?;
        // On error the guard drops here and the count is restored.
        rewrite_target(request, guard.address())?;

        tracing::debug!(url = %guard.address(), uri = %request.uri(), "Forwarding request");

        Ok(DispatchContext { guard })
    }
}

/// State carried from selection to completion of one request.
#[derive(Debug)]
pub struct DispatchContext {
    guard: BackendConnectionGuard,
}

impl DispatchContext {
    pub fn backend(&self) -> &Arc<Backend> {
        self.guard.backend()
    }

    /// Hand the response back to the client. The connection stays counted
    /// until the body has been streamed out or dropped.
    pub fn complete(self, response: Response<Body>) -> Response<Body> {
        let guard = self.guard;
        let (parts, body) = response.into_parts();
        let stream = body.into_data_stream().map(move |chunk| {
            // Keeps the guard alive for as long as the body stream.
            let _held = &guard;
            chunk
        });
        Response::from_parts(parts, Body::from_stream(stream))
    }

    /// Report a transport failure. Releases the connection and demotes the
    /// backend if it refused the connection.
    pub fn fail(self, err: &(dyn StdError + 'static)) -> DispatchError {
        let refused = passive::observe_failure(&self.guard, err);
        tracing::warn!(url = %self.guard.address(), error = %err, refused, "Forward to backend failed");
        DispatchError::Upstream { refused }
    }
}

/// Replace scheme and authority with the backend's, keep path and query.
fn rewrite_target(request: &mut Request<Body>, address: &Url) -> Result<(), DispatchError> {
    let authority_str = &address[Position::BeforeHost..Position::AfterPort];
    let target_err = || DispatchError::Target(address.to_string());

    let authority = Authority::from_str(authority_str).map_err(|_| target_err())?;
    let host = HeaderValue::from_str(authority_str).map_err(|_| target_err())?;

    let mut parts = request.uri().clone().into_parts();
    parts.scheme = Some(Scheme::HTTP);
    parts.authority = Some(authority);
    if parts.path_and_query.is_none() {
        parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    *request.uri_mut() = Uri::from_parts(parts).map_err(|_| target_err())?;
    // Upstream connections are HTTP/1.1 regardless of the client's version.
    *request.version_mut() = Version::HTTP_11;
    request.headers_mut().insert(header::HOST, host);
    Ok(())
}
