//! # GCal Domain
//!
//! Domain types for the Google OAuth token lifecycle.
//!
//! This crate contains:
//! - Persisted record shapes (pending authorization state, token record)
//! - Token endpoint wire types
//! - The auth error taxonomy and Result alias
//! - Provider configuration and tunable lifecycle settings
//!
//! ## Architecture
//! - Depends only on `gcal-common` for error classification and storage
//!   errors
//! - Pure data and validation, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
