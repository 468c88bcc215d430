//! # GCal Infrastructure
//!
//! Implementations of the `gcal-core` ports and the I/O around them.
//!
//! This crate contains:
//! - The reqwest token endpoint client
//! - The loopback callback server (axum)
//! - Configuration loading from the environment or files
//! - Tracing subscriber setup
//!
//! ## Architecture
//! - Implements traits defined in `gcal-core`
//! - Contains all network and process-environment code

pub mod config;
pub mod http;
pub mod oauth;
pub mod observability;

// Re-export commonly used items
pub use http::{AuthorizedClient, GoogleTokenClient};
pub use oauth::CallbackServer;
pub use observability::{init_tracing, LogFormat};
