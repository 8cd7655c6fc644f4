//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the backend pool from the validated configuration
//! - Run one health pass before traffic is accepted
//! - Start background tasks (health monitor, metrics, signal handling)
//! - Bind listeners and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when a first verdict exists)
//! - One pool instance, shared by `Arc` with every component

use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::admin::{setup_admin_router, AdminState};
use crate::config::{parse_backend_url, ConfigError, ProxyConfig, ValidationError};
use crate::health::HealthChecker;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::load_balancer::BackendPool;
use crate::observability::metrics;

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Backend(#[from] ValidationError),
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// A configured pool with its health checker, ready to serve.
pub struct Balancer {
    config: ProxyConfig,
    pool: Arc<BackendPool>,
    checker: HealthChecker,
}

impl Balancer {
    pub fn from_config(config: ProxyConfig) -> Result<Self, StartupError> {
        let addresses = config
            .urls
            .iter()
            .map(|raw| parse_backend_url(raw))
            .collect::<Result<Vec<_>, _>>()?;

        let pool = Arc::new(BackendPool::from_addresses(addresses));
        let checker = HealthChecker::new(pool.clone(), config.health_check());

        Ok(Self {
            config,
            pool,
            checker,
        })
    }

    pub fn pool(&self) -> &Arc<BackendPool> {
        &self.pool
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Serve proxy and admin traffic until `shutdown` fires.
    ///
    /// If the proxy listener stops for any other reason, shutdown is
    /// triggered so the admin listener and health monitor stop with it.
    pub async fn serve(self, proxy: TcpListener, admin: TcpListener, shutdown: Shutdown) -> Result<(), StartupError> {
        // Subscribe before the first await so an early signal is not missed.
        let monitor_rx = shutdown.subscribe();
        let mut admin_rx = shutdown.subscribe();
        let proxy_rx = shutdown.subscribe();

        // Nothing is spawned yet, so failing here leaves no task behind.
        let admin_addr = admin.local_addr()?;

        self.checker.check_all().await;
        if self.pool.status().active_backends == 0 {
            tracing::warn!("No healthy backends yet; requests will return 503 until one is up");
        }

        let monitor = tokio::spawn(self.checker.clone().run(monitor_rx));

        let admin_app = setup_admin_router(AdminState {
            pool: self.pool.clone(),
            checker: self.checker.clone(),
        });
        let admin_task = tokio::spawn(async move {
            tracing::info!(address = %admin_addr, "Admin server listening");
            axum::serve(admin, admin_app)
                .with_graceful_shutdown(async move {
                    let _ = admin_rx.recv().await;
                })
                .await
        });

        let server = HttpServer::new(self.pool.clone(), self.config.strategy);
        let result = server.run(proxy, proxy_rx).await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "Proxy server failed, shutting down");
        }
        shutdown.trigger();

        match admin_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Admin server error"),
            Err(e) => tracing::error!(error = %e, "Admin server task failed"),
        }
        let _ = monitor.await;

        result.map_err(StartupError::from)
    }
}

/// Bind a TCP listener, naming the address on failure.
pub async fn bind(address: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.to_string(),
            source,
        })
}

/// Run the proxy described by `config` until SIGINT/SIGTERM.
pub async fn run(config: ProxyConfig) -> Result<(), StartupError> {
    tracing::info!(
        proxy_address = %config.proxy_address(),
        admin_address = %config.admin_address(),
        strategy = %config.strategy,
        backends = config.urls.len(),
        "Configuration loaded"
    );

    if let Some(address) = &config.metrics_address {
        match address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(metrics_address = %address, error = %e, "Failed to parse metrics address"),
        }
    }

    let balancer = Balancer::from_config(config)?;
    let proxy = bind(&balancer.config().proxy_address()).await?;
    let admin = bind(&balancer.config().admin_address()).await?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    balancer.serve(proxy, admin, shutdown).await?;
    tracing::info!("Shutdown complete");
    Ok(())
}
