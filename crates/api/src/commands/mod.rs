//! Command handlers
//!
//! Handlers return data; printing is left to the binary.

pub mod auth;

pub use auth::{expire, header, login, logout, status, StatusReport};
