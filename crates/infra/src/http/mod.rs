//! HTTP clients
//!
//! - [`GoogleTokenClient`]: the token endpoint port over reqwest
//! - [`AuthorizedClient`]: requests carrying the current access token

pub mod authorized;
pub mod token_client;

pub use authorized::AuthorizedClient;
pub use token_client::GoogleTokenClient;
