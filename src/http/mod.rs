//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → dispatch.rs (pick backend, count connection, rewrite target)
//!     → hyper client forwards to the backend
//!     → dispatch.rs (release connection, demote on refusal)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod server;

pub use dispatch::{DispatchContext, DispatchError, Dispatcher};
pub use server::HttpServer;
