//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer, or a backend was just added
//!     → Copy pool members, release pool lock
//!     → Probe each backend concurrently (bounded timeout)
//!     → Set liveness per backend
//!
//! Passive health checks (passive.rs):
//!     Forward failed with connection refused
//!     → Mark that backend dead immediately
//! ```
//!
//! # Design Decisions
//! - Active and passive checks are complementary
//! - A failed check never removes a backend; a later pass can revive it
//! - Health state is per-backend, not per-pool

pub mod active;
pub mod passive;

pub use active::HealthChecker;
