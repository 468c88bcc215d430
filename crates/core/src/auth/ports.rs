//! Token endpoint port
//!
//! The lifecycle manager never speaks HTTP itself; it calls through this
//! trait so the transport can be swapped for a mock in tests.

use async_trait::async_trait;
use gcal_domain::{AuthResult, TokenResponse};

/// The provider's token endpoint.
#[async_trait]
pub trait TokenEndpoint: Send + Sync {
    /// Trade an authorization code and its PKCE verifier for tokens.
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> AuthResult<TokenResponse>;

    /// Obtain a new access token with a refresh token.
    async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenResponse>;
}
