//! # till-http
//!
//! HTTP gateway to the store backend for the till sales terminal.
//!
//! This crate provides:
//! - `HttpGateway`: the `reqwest`-backed `BackendGateway` implementation
//! - `BackendConfig` / `AuthContext`: connection settings and the bearer
//!   credential, loadable from the environment
//!
//! Required environment variables:
//! - `TILL_BACKEND_URL`: base URL of the store backend
//! - `TILL_API_TOKEN`: bearer token for the signed-in cashier
//! - `TILL_HTTP_TIMEOUT_SECS`: optional request timeout override

pub mod client;
pub mod config;

// Re-export commonly used types
pub use client::HttpGateway;
pub use config::{AuthContext, BackendConfig, DEFAULT_TIMEOUT_SECS};
