//! # GCal Core
//!
//! Token lifecycle logic - no HTTP or filesystem code.
//!
//! This crate contains:
//! - The token lifecycle manager and its stores
//! - The token endpoint port (trait)
//! - A scriptable mock endpoint behind the `test-utils` feature
//!
//! ## Architecture Principles
//! - Depends on `gcal-common` and `gcal-domain` only
//! - Persistence through `gcal_common::storage::KeyValueStore`
//! - Token endpoint access through [`auth::TokenEndpoint`]

pub mod auth;

#[cfg(any(feature = "test-utils", test))]
pub use auth::MockTokenEndpoint;
pub use auth::{
    CallbackParams, ReadinessSubscription, TokenAvailability, TokenEndpoint, TokenLifecycleManager,
};
