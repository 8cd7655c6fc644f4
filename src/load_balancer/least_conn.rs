//! Least Connections load balancing strategy.

use std::sync::Arc;
use crate::load_balancer::{LoadBalancer, backend::Backend};

/// Least connections selector.
/// Selects the alive backend with the minimum number of in-flight connections.
#[derive(Debug, Default)]
pub struct LeastConnections;

impl LeastConnections {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for LeastConnections {
    fn next_server(&self, backends: &[Arc<Backend>], _cursor: &mut usize) -> Option<Arc<Backend>> {
        // `min_by_key` keeps the first of equal minima, so ties go to sequence order.
        backends
            .iter()
            .filter(|b| b.is_alive())
            .min_by_key(|b| b.connections())
            .cloned()
    }
}
