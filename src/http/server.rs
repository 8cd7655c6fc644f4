//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler
//! - Wire up middleware (tracing, request ID)
//! - Bind server to listener
//! - Dispatch requests through the backend pool
//! - Forward requests to upstream backends
//! - Observability (metrics, correlation IDs)

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    Router,
};
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::http::dispatch::Dispatcher;
use crate::load_balancer::{BackendPool, Strategy};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub client: Client<HttpConnector, Body>,
}

/// HTTP server for the reverse proxy.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a proxy server that balances over `pool` with `strategy`.
    pub fn new(pool: Arc<BackendPool>, strategy: Strategy) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .build(HttpConnector::new());

        let state = AppState {
            dispatcher: Arc::new(Dispatcher::new(pool, strategy)),
            client,
        };

        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "Proxy server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("Proxy server stopped");
        Ok(())
    }
}

/// Main proxy handler.
/// Selects a backend, forwards the request and reports the outcome.
async fn proxy_handler(
    State(state): State<AppState>,
    mut request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let ctx = match state.dispatcher.begin(&mut request) {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::warn!(request_id = %request_id, path = %request.uri().path(), error = %e, "Cannot dispatch request");
            metrics::record_request(&method, e.status().as_u16(), "none", start_time);
            return e.into_response();
        }
    };
    let backend = ctx.backend().address().to_string();

    match state.client.request(request).await {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), &backend, start_time);
            ctx.complete(into_axum(response))
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, backend = %backend, error = %e, "Upstream error");
            let err = ctx.fail(&e);
            metrics::record_request(&method, err.status().as_u16(), &backend, start_time);
            err.into_response()
        }
    }
}

fn into_axum(response: Response<Incoming>) -> Response<Body> {
    response.map(Body::new)
}
