//! Backend pool management.
//!
//! # Responsibilities
//! - Own the ordered list of backends and the rotation cursor
//! - Apply load balancing strategies to select backends
//! - Provide connection guards for tracking
//! - Membership and liveness mutation, status snapshots

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use url::Url;

use crate::load_balancer::{
    Strategy,
    backend::{Backend, BackendConnectionGuard, BackendStatus},
};

#[derive(Debug, Default)]
struct PoolState {
    members: Vec<Arc<Backend>>,
    /// Always `< members.len()`, or 0.
    cursor: usize,
}

/// The live, mutable collection of backends plus selection state.
#[derive(Debug, Default)]
pub struct BackendPool {
    state: Mutex<PoolState>,
}

/// Aggregate status, as reported by the admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub total_backends: usize,
    pub active_backends: usize,
    pub backends: Vec<BackendStatus>,
}

impl BackendPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pool from already validated addresses, in order.
    pub fn from_addresses(addresses: impl IntoIterator<Item = Url>) -> Self {
        let pool = Self::new();
        for address in addresses {
            pool.add(address);
        }
        pool
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        // The critical sections never leave the state half-updated.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Select an alive backend under `strategy`.
    pub fn select(&self, strategy: Strategy) -> Option<Arc<Backend>> {
        let mut state = self.lock();
        let PoolState { members, cursor } = &mut *state;
        strategy.balancer().next_server(members, cursor)
    }

    /// Select an alive backend and open a tracked connection to it.
    /// The connection count is decremented when the guard drops.
    pub fn acquire(&self, strategy: Strategy) -> Option<BackendConnectionGuard> {
        match self.select(strategy) {
            Some(backend) => Some(backend.connect()),
            None => {
                tracing::debug!(strategy = %strategy, members = self.len(), "No alive backend to select");
                None
            }
        }
    }

    /// Append a backend. Duplicate addresses are allowed.
    pub fn add(&self, address: Url) -> Arc<Backend> {
        let backend = Arc::new(Backend::new(address));
        let total = {
            let mut state = self.lock();
            state.members.push(backend.clone());
            state.members.len()
        };
        tracing::info!(url = %backend.address(), total, "Backend added");
        backend
    }

    /// Remove the first backend whose address equals `address`.
    pub fn remove(&self, address: &Url) -> bool {
        let removed = {
            let mut state = self.lock();
            match state.members.iter().position(|b| b.address() == address) {
                Some(index) => {
                    state.members.remove(index);
                    if state.cursor >= state.members.len() {
                        state.cursor = 0;
                    }
                    true
                }
                None => false,
            }
        };
        if removed {
            tracing::info!(url = %address, "Backend removed");
        } else {
            tracing::debug!(url = %address, "Backend not found for removal");
        }
        removed
    }

    /// Set liveness of the first backend matching `address`. No-op if absent.
    pub fn set_liveness(&self, address: &Url, alive: bool) {
        let backend = self
            .lock()
            .members
            .iter()
            .find(|b| b.address() == address)
            .cloned();
        if let Some(backend) = backend {
            backend.set_alive(alive);
        }
    }

    /// Copy of the current member list. The pool lock is released on return.
    pub fn members(&self) -> Vec<Arc<Backend>> {
        self.lock().members.clone()
    }

    /// Point-in-time status of every member, in order.
    pub fn snapshot(&self) -> Vec<BackendStatus> {
        self.lock().members.iter().map(|b| b.status()).collect()
    }

    pub fn status(&self) -> PoolStatus {
        let backends = self.snapshot();
        PoolStatus {
            total_backends: backends.len(),
            active_backends: backends.iter().filter(|b| b.alive).count(),
            backends,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
