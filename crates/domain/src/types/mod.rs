//! Domain data types

pub mod readiness;
pub mod state;
pub mod token;

pub use readiness::Readiness;
pub use state::StateRecord;
pub use token::{GrantType, TokenRecord, TokenRequest, TokenResponse};
