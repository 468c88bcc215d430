//! OAuth 2.0 Authorization Code + PKCE token lifecycle
//!
//! Provides:
//! - PKCE verifier/challenge generation (RFC 7636, S256)
//! - Single-use pending authorization records with lazy expiry
//! - The persisted token record with refresh-token carry-over
//! - A debounced readiness signal
//! - [`TokenLifecycleManager`], which ties them together

pub mod callback;
pub mod manager;
#[cfg(any(feature = "test-utils", test))]
pub mod mocks;
pub mod pkce;
pub mod ports;
pub mod readiness;
pub mod state_store;
pub mod token_store;

pub use callback::CallbackParams;
pub use manager::{TokenAvailability, TokenLifecycleManager};
#[cfg(any(feature = "test-utils", test))]
pub use mocks::MockTokenEndpoint;
pub use pkce::PkcePair;
pub use ports::TokenEndpoint;
pub use readiness::{ReadinessSignal, ReadinessSubscription};
pub use state_store::StateRecordStore;
pub use token_store::TokenStore;
