//! Load-balancing reverse proxy library.
//!
//! A dynamic pool of backends, selected round-robin or by least
//! connections, kept honest by periodic and on-demand health checks, and
//! managed at runtime through a small admin API.

pub mod admin;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::{Balancer, Shutdown};
pub use load_balancer::{BackendPool, Strategy};
