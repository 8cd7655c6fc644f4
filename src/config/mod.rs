//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (JSON/TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → plain values handed to the pool, health monitor and listeners
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; pool membership changes at runtime
//!   go through the admin API and are not written back
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod duration;
pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{HealthCheckConfig, ProxyConfig};
pub use validation::{parse_backend_url, ValidationError};
