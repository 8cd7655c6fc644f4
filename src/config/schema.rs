//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! Keys are snake_case; the camelCase spellings used by JSON config files
//! (`proxyPort`, `healthCheckFreq`, ...) are accepted as aliases.

use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

use crate::config::duration::parse_duration;
use crate::load_balancer::Strategy;

const DEFAULT_HEALTH_CHECK_FREQ: Duration = Duration::from_secs(5);
const DEFAULT_HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Root configuration for the reverse proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Port the proxy listener binds to.
    #[serde(alias = "proxyPort", deserialize_with = "port")]
    pub proxy_port: u16,

    /// Port the admin API binds to.
    #[serde(alias = "adminPort", deserialize_with = "port")]
    pub admin_port: u16,

    /// Interface both listeners bind to.
    #[serde(alias = "bindHost")]
    pub bind_host: String,

    /// Peer selection strategy.
    pub strategy: Strategy,

    /// Interval between health check passes (e.g. "5s").
    #[serde(alias = "healthCheckFreq")]
    pub health_check_freq: String,

    /// Path probed on every backend.
    #[serde(alias = "healthCheckPath")]
    pub health_check_path: String,

    /// Per-probe timeout (e.g. "2s").
    #[serde(alias = "healthCheckTimeout")]
    pub health_check_timeout: String,

    /// Initial backend URLs, in pool order.
    pub urls: Vec<String>,

    /// Default tracing filter when `RUST_LOG` is unset.
    #[serde(alias = "logLevel")]
    pub log_level: String,

    /// Prometheus exporter address; metrics are off when unset.
    #[serde(alias = "metricsAddress")]
    pub metrics_address: Option<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            proxy_port: 8080,
            admin_port: 8081,
            bind_host: "0.0.0.0".to_string(),
            strategy: Strategy::RoundRobin,
            health_check_freq: "5s".to_string(),
            health_check_path: "/books".to_string(),
            health_check_timeout: "2s".to_string(),
            urls: Vec::new(),
            log_level: "info".to_string(),
            metrics_address: None,
        }
    }
}

impl ProxyConfig {
    pub fn proxy_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.proxy_port)
    }

    pub fn admin_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.admin_port)
    }

    /// Resolved view of the health check settings.
    pub fn health_check(&self) -> HealthCheckConfig {
        HealthCheckConfig {
            interval: positive_duration("health_check_freq", &self.health_check_freq, DEFAULT_HEALTH_CHECK_FREQ),
            timeout: positive_duration("health_check_timeout", &self.health_check_timeout, DEFAULT_HEALTH_CHECK_TIMEOUT),
            path: self.health_check_path.clone(),
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckConfig {
    /// Time between passes.
    pub interval: Duration,
    /// A probe that takes longer than this fails.
    pub timeout: Duration,
    /// Path to probe for HTTP health checks.
    pub path: String,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_HEALTH_CHECK_FREQ,
            timeout: DEFAULT_HEALTH_CHECK_TIMEOUT,
            path: "/books".to_string(),
        }
    }
}

/// Unparsable or zero durations fall back to `default`.
fn positive_duration(field: &'static str, raw: &str, default: Duration) -> Duration {
    match parse_duration(raw) {
        Some(d) if !d.is_zero() => d,
        _ => {
            tracing::warn!(field, value = %raw, default = ?default, "Invalid duration, using default");
            default
        }
    }
}

/// Ports appear as numbers in TOML and as strings in JSON configs.
fn port<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u16, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(n) => Ok(n),
        Port::Text(s) => s
            .trim()
            .trim_start_matches(':')
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid port `{s}`"))),
    }
}
