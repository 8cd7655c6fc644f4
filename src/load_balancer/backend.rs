//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single upstream server
//! - Track in-flight connections (for Least Connections LB)
//! - Track liveness behind a per-backend lock

use serde::Serialize;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use url::Url;

use crate::observability::metrics;

/// A single backend server.
#[derive(Debug)]
pub struct Backend {
    /// Scheme and host of the backend. Never changes after creation.
    address: Url,
    /// Liveness verdict. Guarded separately from the pool so probing one
    /// backend never blocks readers of another.
    alive: RwLock<bool>,
    /// Number of requests currently forwarded to this backend.
    connections: AtomicUsize,
}

impl Backend {
    /// Create a new backend. Liveness starts unverified (dead).
    pub fn new(address: Url) -> Self {
        Self {
            address,
            alive: RwLock::new(false),
            connections: AtomicUsize::new(0),
        }
    }

    pub fn address(&self) -> &Url {
        &self.address
    }

    pub fn is_alive(&self) -> bool {
        *self.alive.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set liveness and return the previous value.
    pub fn set_alive(&self, alive: bool) -> bool {
        let mut guard = self.alive.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, alive)
    }

    /// Get the current number of in-flight connections.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::Acquire)
    }

    /// Open a tracked connection to this backend.
    ///
    /// The counter is incremented now and decremented exactly once, when the
    /// returned guard is dropped.
    pub fn connect(self: &Arc<Self>) -> BackendConnectionGuard {
        let current = self.connections.fetch_add(1, Ordering::AcqRel) + 1;
        metrics::record_backend_connections(self.address.as_str(), current);
        BackendConnectionGuard {
            backend: self.clone(),
        }
    }

    /// Point-in-time projection used for reporting.
    pub fn status(&self) -> BackendStatus {
        BackendStatus {
            url: self.address.to_string(),
            alive: self.is_alive(),
            current_connections: self.connections(),
        }
    }
}

/// Read-only view of a backend at the time it was taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendStatus {
    pub url: String,
    pub alive: bool,
    pub current_connections: usize,
}

/// A RAII guard that owns one increment of a backend's connection count.
#[derive(Debug)]
pub struct BackendConnectionGuard {
    backend: Arc<Backend>,
}

impl BackendConnectionGuard {
    /// The backend this connection was opened against.
    pub fn backend(&self) -> &Arc<Backend> {
        &self.backend
    }
}

impl Deref for BackendConnectionGuard {
    type Target = Backend;
    fn deref(&self) -> &Self::Target {
        &self.backend
    }
}

impl Drop for BackendConnectionGuard {
    fn drop(&mut self) {
        // Only guards decrement, and each guard owns one increment.
        let current = self.backend.connections.fetch_sub(1, Ordering::AcqRel) - 1;
        metrics::record_backend_connections(self.backend.address.as_str(), current);
    }
}
