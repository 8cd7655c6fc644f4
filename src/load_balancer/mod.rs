//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → pool.rs (lock members + cursor)
//!     → Apply load balancing strategy:
//!         - round_robin.rs (rotate through alive backends)
//!         - least_conn.rs (pick alive backend with fewest connections)
//!     → backend.rs (open a connection guard)
//!     → Return guard, or None when nothing is alive
//! ```
//!
//! # Design Decisions
//! - Strategies are stateless; the pool owns the rotation cursor
//! - Pool lock covers membership and cursor only, never I/O
//! - Liveness is locked per backend, connection counts are atomics
//! - Dead backends excluded from selection

pub mod backend;
pub mod least_conn;
pub mod pool;
pub mod round_robin;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use self::backend::Backend;
use self::least_conn::LeastConnections;
use self::round_robin::RoundRobin;

pub use self::backend::{BackendConnectionGuard, BackendStatus};
pub use self::pool::{BackendPool, PoolStatus};

/// A peer selection algorithm.
pub trait LoadBalancer: Send + Sync + fmt::Debug {
    /// Pick an alive backend from `backends`, or `None`.
    ///
    /// `cursor` is the pool's persistent rotation index; strategies that do
    /// not rotate leave it alone.
    fn next_server(&self, backends: &[Arc<Backend>], cursor: &mut usize) -> Option<Arc<Backend>>;
}

/// Which load balancing algorithm to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Strategy {
    #[default]
    RoundRobin,
    LeastConnections,
}

impl Strategy {
    /// Parse a strategy name. Case-insensitive; unknown names fall back to
    /// round-robin.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "least-connections" | "least_conn" | "least" => Strategy::LeastConnections,
            "round-robin" | "" => Strategy::RoundRobin,
            other => {
                tracing::warn!(strategy = %other, "Unknown strategy, falling back to round-robin");
                Strategy::RoundRobin
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::RoundRobin => "round-robin",
            Strategy::LeastConnections => "least-connections",
        }
    }

    pub(crate) fn balancer(&self) -> &'static dyn LoadBalancer {
        static ROUND_ROBIN: RoundRobin = RoundRobin;
        static LEAST_CONNECTIONS: LeastConnections = LeastConnections;
        match self {
            Strategy::RoundRobin => &ROUND_ROBIN,
            Strategy::LeastConnections => &LEAST_CONNECTIONS,
        }
    }
}

impl From<String> for Strategy {
    fn from(value: String) -> Self {
        Strategy::parse(&value)
    }
}

impl From<Strategy> for String {
    fn from(value: Strategy) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
