//! Administrative API: pool status and runtime membership changes.
//!
//! ```text
//! GET    /status    → pool snapshot as JSON
//! POST   /backends  {"url": ...} → 201, then background health pass
//! DELETE /backends  {"url": ...} → 204, or 404 when not a member
//! ```

pub mod handlers;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::health::HealthChecker;
use crate::load_balancer::BackendPool;
use self::handlers::*;

/// Shared state for admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub pool: Arc<BackendPool>,
    pub checker: HealthChecker,
}

pub fn setup_admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/backends", post(add_backend).delete(remove_backend))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
