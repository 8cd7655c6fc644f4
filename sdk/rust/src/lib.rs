//! Client for the reverse-balancer admin API.

pub mod client;

pub use client::{AdminClient, BackendInfo, PoolStatus};
