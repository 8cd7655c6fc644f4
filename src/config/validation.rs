//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Backend URLs carry the http scheme and a host
//! - Validate value ranges (ports nonzero, probe path absolute)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - The same URL check guards the admin API, so the pool never stores an
//!   invalid address

use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with the configuration or an admin input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid backend url `{url}`: {reason}")]
    BackendUrl { url: String, reason: String },

    #[error("{field} must be nonzero")]
    ZeroPort { field: &'static str },

    #[error("proxy_port and admin_port must differ (both {0})")]
    PortClash(u16),

    #[error("health_check_path `{0}` must start with '/'")]
    HealthPath(String),
}

/// Parse a backend URL, requiring the http scheme and a host.
///
/// Backends are reached over plain HTTP; TLS to upstreams is not supported.
pub fn parse_backend_url(raw: &str) -> Result<Url, ValidationError> {
    let invalid = |reason: &str| ValidationError::BackendUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty"));
    }
    let url = Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;
    if url.scheme() != "http" {
        return Err(invalid("scheme must be http"));
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(invalid("missing host")),
    }
}

/// Check a loaded configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.proxy_port == 0 {
        errors.push(ValidationError::ZeroPort { field: "proxy_port" });
    }
    if config.admin_port == 0 {
        errors.push(ValidationError::ZeroPort { field: "admin_port" });
    }
    if config.proxy_port != 0 && config.proxy_port == config.admin_port {
        errors.push(ValidationError::PortClash(config.proxy_port));
    }
    if !config.health_check_path.starts_with('/') {
        errors.push(ValidationError::HealthPath(config.health_check_path.clone()));
    }
    for raw in &config.urls {
        if let Err(e) = parse_backend_url(raw) {
            errors.push(e);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_scheme_and_host() {
        let url = parse_backend_url("http://localhost:9001").unwrap();
        assert_eq!(url.host_str(), Some("localhost"));
        assert!(parse_backend_url("http://api.internal").is_ok());
    }

    #[test]
    fn rejects_schemeless_and_hostless() {
        assert!(parse_backend_url("localhost:9001").is_err());
        assert!(parse_backend_url("127.0.0.1:9001").is_err());
        assert!(parse_backend_url("file:///tmp/x").is_err());
        assert!(parse_backend_url("https://api.internal").is_err());
        assert!(parse_backend_url("").is_err());
        assert!(parse_backend_url("not a url").is_err());
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let config = ProxyConfig {
            proxy_port: 0,
            health_check_path: "books".into(),
            urls: vec!["http://ok:1".into(), "nope".into(), "ftp://x".into()],
            ..ProxyConfig::default()
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::ZeroPort { field: "proxy_port" }));
        assert!(errors.contains(&ValidationError::HealthPath("books".into())));
    }

    #[test]
    fn port_clash_is_reported() {
        let config = ProxyConfig {
            proxy_port: 9000,
            admin_port: 9000,
            ..ProxyConfig::default()
        };
        assert_eq!(validate_config(&config).unwrap_err(), vec![ValidationError::PortClash(9000)]);
    }
}
