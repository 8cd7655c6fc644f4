//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every backend in the pool
//! - Probe on demand (e.g. right after a backend is added)
//! - Update backend liveness based on results

use std::sync::Arc;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use futures_util::future::join_all;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::load_balancer::{BackendPool, backend::Backend};
use crate::observability::metrics;

/// Probes pool members and records liveness verdicts.
#[derive(Clone)]
pub struct HealthChecker {
    pool: Arc<BackendPool>,
    config: HealthCheckConfig,
    client: Client<HttpConnector, Body>,
}

impl HealthChecker {
    pub fn new(pool: Arc<BackendPool>, config: HealthCheckConfig) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .build(HttpConnector::new());

        Self {
            pool,
            config,
            client,
        }
    }

    /// Run a pass every `interval` until shutdown. The first tick is one
    /// interval away; startup performs its own initial pass.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval = ?self.config.interval,
            timeout = ?self.config.timeout,
            path = %self.config.path,
            "Health monitor starting"
        );

        let mut ticker = time::interval_at(Instant::now() + self.config.interval, self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Fire-and-forget pass, used after the pool gains a member.
    pub fn spawn_check(&self) -> JoinHandle<()> {
        let checker = self.clone();
        tokio::spawn(async move {
            checker.check_all().await;
        })
    }

    /// Probe every current member concurrently; returns once all probes finish.
    ///
    /// Works on a copy of the member list so the pool lock is not held while
    /// probes are in flight. Members removed meanwhile are updated harmlessly.
    pub async fn check_all(&self) {
        let members = self.pool.members();

        let probes = members.iter().map(|backend| async move {
            let healthy = self.probe(backend).await;
            let was_alive = backend.set_alive(healthy);
            if was_alive != healthy {
                if healthy {
                    tracing::info!(url = %backend.address(), "Backend is alive");
                } else {
                    tracing::warn!(url = %backend.address(), "Backend is down");
                }
            }
            metrics::record_backend_health(backend.address().as_str(), healthy);
            healthy
        });
        let verdicts = join_all(probes).await;

        tracing::debug!(
            total = verdicts.len(),
            alive = verdicts.iter().filter(|alive| **alive).count(),
            "Health check pass complete"
        );
    }

    /// GET the health path; success means a response within the timeout and
    /// a status in [200, 400).
    async fn probe(&self, backend: &Backend) -> bool {
        let target = match backend.address().join(&self.config.path) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(url = %backend.address(), error = %e, "Failed to build health check url");
                return false;
            }
        };

        let request = match Request::builder()
            .method(Method::GET)
            .uri(target.as_str())
            .header(header::USER_AGENT, "reverse-balancer-health-check")
            .body(Body::empty()) {
                Ok(req) => req,
                Err(e) => {
                    tracing::error!(url = %target, error = %e, "Failed to build health check request");
                    return false;
                }
            };

        match time::timeout(self.config.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => {
                let healthy = is_healthy_status(response.status());
                if !healthy {
                    tracing::debug!(url = %target, status = %response.status(), "Health check failed: bad status");
                }
                healthy
            }
            Ok(Err(e)) => {
                tracing::debug!(url = %target, error = %e, "Health check failed: connection error");
                false
            }
            Err(_) => {
                tracing::debug!(url = %target, timeout = ?self.config.timeout, "Health check failed: timeout");
                false
            }
        }
    }
}

fn is_healthy_status(status: StatusCode) -> bool {
    (200..400).contains(&status.as_u16())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use url::Url;

    fn checker(pool: Arc<BackendPool>, timeout: Duration) -> HealthChecker {
        HealthChecker::new(pool, HealthCheckConfig { timeout, ..HealthCheckConfig::default() })
    }

    #[test]
    fn status_classification() {
        assert!(is_healthy_status(StatusCode::OK));
        assert!(is_healthy_status(StatusCode::NO_CONTENT));
        assert!(is_healthy_status(StatusCode::MOVED_PERMANENTLY));
        assert!(!is_healthy_status(StatusCode::NOT_FOUND));
        assert!(!is_healthy_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_healthy_status(StatusCode::CONTINUE));
    }

    #[tokio::test]
    async fn refused_backend_is_marked_dead() {
        // Grab a free port, then close it so connections are refused.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let pool = Arc::new(BackendPool::new());
        let backend = pool.add(Url::parse(&format!("http://{}", addr)).unwrap());
        backend.set_alive(true);

        let checker = checker(pool.clone(), Duration::from_millis(500));
        checker.check_all().await;

        assert!(!backend.is_alive());
        assert_eq!(pool.len(), 1, "probe failure must not remove the backend");
    }

    #[tokio::test]
    async fn empty_pool_pass_completes() {
        let checker = checker(Arc::new(BackendPool::new()), Duration::from_millis(100));
        checker.check_all().await;
        checker.spawn_check().await.unwrap();
    }
}
