//! Provider configuration and lifecycle settings

use std::time::Duration as StdDuration;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{
    EXPIRY_SAFETY_MARGIN_MS, GOOGLE_AUTHORIZATION_ENDPOINT, GOOGLE_TOKEN_ENDPOINT,
    READINESS_DEBOUNCE_MS, SECURITY_TOKEN_LENGTH, STATE_TTL_MS, VERIFIER_LENGTH,
};
use crate::errors::{AuthError, AuthResult};

/// OAuth client registration, injected at construction.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Callback URL registered with the provider.
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    #[serde(default = "default_authorization_endpoint")]
    pub authorization_endpoint: String,
    #[serde(default = "default_token_endpoint")]
    pub token_endpoint: String,
}

fn default_authorization_endpoint() -> String {
    GOOGLE_AUTHORIZATION_ENDPOINT.to_string()
}

fn default_token_endpoint() -> String {
    GOOGLE_TOKEN_ENDPOINT.to_string()
}

impl OAuthConfig {
    /// Configuration against Google's production endpoints.
    pub fn google(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            scopes,
            authorization_endpoint: default_authorization_endpoint(),
            token_endpoint: default_token_endpoint(),
        }
    }

    /// Scopes joined with single spaces.
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }

    /// Check required fields and URL syntax.
    pub fn validate(&self) -> AuthResult<()> {
        if self.client_id.trim().is_empty() {
            return Err(AuthError::Config("client_id is required".into()));
        }
        if self.client_secret.trim().is_empty() {
            return Err(AuthError::Config("client_secret is required".into()));
        }
        if self.scopes.iter().all(|s| s.trim().is_empty()) {
            return Err(AuthError::Config("at least one scope is required".into()));
        }
        for (name, value) in [
            ("redirect_uri", &self.redirect_uri),
            ("authorization_endpoint", &self.authorization_endpoint),
            ("token_endpoint", &self.token_endpoint),
        ] {
            Url::parse(value)
                .map_err(|err| AuthError::Config(format!("{name} is not a valid URL: {err}")))?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("authorization_endpoint", &self.authorization_endpoint)
            .field("token_endpoint", &self.token_endpoint)
            .finish()
    }
}

/// Tunables of the token lifecycle. Defaults match Google's flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerSettings {
    /// Lifetime of a pending authorization attempt.
    pub state_ttl: Duration,
    /// Subtracted from every token lifetime before storing its expiry.
    pub expiry_safety_margin: Duration,
    pub verifier_length: usize,
    pub security_token_length: usize,
    /// Quiet period before readiness observers see a change.
    pub readiness_debounce: StdDuration,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            state_ttl: Duration::milliseconds(STATE_TTL_MS),
            expiry_safety_margin: Duration::milliseconds(EXPIRY_SAFETY_MARGIN_MS),
            verifier_length: VERIFIER_LENGTH,
            security_token_length: SECURITY_TOKEN_LENGTH,
            readiness_debounce: StdDuration::from_millis(READINESS_DEBOUNCE_MS),
        }
    }
}
