//! Token endpoint wire types and the persisted token record

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AuthError, AuthResult};

const REDACTED: &str = "[redacted]";

/// Key used when reporting an undecodable token endpoint response.
pub const TOKEN_RESPONSE_KEY: &str = "token_response";

/// The single persisted credential set.
///
/// Overwritten on every successful exchange or refresh and deleted on
/// logout.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,
    /// Scheme used in the `Authorization` header, e.g. `Bearer`.
    pub token_type: String,
    /// Lifetime in seconds, as received.
    pub expires_in: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    /// Absolute expiry, already reduced by the safety margin. Assigned on
    /// store when absent.
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenRecord {
    /// `"<token_type> <access_token>"`.
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    /// Whether the access token is still usable at `now`. A record without
    /// an expiry is treated as expired.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at > now)
    }

    /// Fill in `expires_at` from `expires_in` if it is not already set.
    ///
    /// # Errors
    /// Returns [`AuthError::CorruptRecord`] if the lifetime does not fit in a
    /// timestamp.
    pub fn normalize_expiry(
        &mut self,
        now: DateTime<Utc>,
        safety_margin: Duration,
    ) -> AuthResult<()> {
        if self.expires_at.is_some() {
            return Ok(());
        }
        let expires_at = Duration::try_seconds(self.expires_in)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .and_then(|at| at.checked_sub_signed(safety_margin))
            .ok_or_else(|| AuthError::corrupt(TOKEN_RESPONSE_KEY, "expires_in out of range"))?;
        self.expires_at = Some(expires_at);
        Ok(())
    }
}

impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("access_token", &REDACTED)
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| REDACTED))
            .field("scope", &self.scope)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

impl From<TokenResponse> for TokenRecord {
    fn from(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            token_type: response.token_type,
            expires_in: response.expires_in,
            refresh_token: response.refresh_token,
            scope: response.scope,
            id_token: response.id_token,
            expires_at: None,
        }
    }
}

/// Successful token endpoint response.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

impl TokenResponse {
    /// Reject responses that decode but cannot produce a usable header.
    pub fn validate(self) -> AuthResult<Self> {
        if self.access_token.trim().is_empty() {
            return Err(AuthError::corrupt(TOKEN_RESPONSE_KEY, "empty access_token"));
        }
        if self.token_type.trim().is_empty() {
            return Err(AuthError::corrupt(TOKEN_RESPONSE_KEY, "empty token_type"));
        }
        if self.expires_in < 0 {
            return Err(AuthError::corrupt(TOKEN_RESPONSE_KEY, "negative expires_in"));
        }
        Ok(self)
    }
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish_non_exhaustive()
    }
}

/// OAuth grant carried by a token request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    AuthorizationCode,
    RefreshToken,
}

/// JSON body posted to the token endpoint.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct TokenRequest {
    pub client_id: String,
    pub client_secret: String,
    pub grant_type: GrantType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_verifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl TokenRequest {
    /// Authorization-code grant carrying the PKCE verifier.
    pub fn authorization_code(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        code: impl Into<String>,
        code_verifier: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            grant_type: GrantType::AuthorizationCode,
            code: Some(code.into()),
            code_verifier: Some(code_verifier.into()),
            redirect_uri: Some(redirect_uri.into()),
            refresh_token: None,
        }
    }

    /// Refresh-token grant.
    pub fn refresh(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            grant_type: GrantType::RefreshToken,
            code: None,
            code_verifier: None,
            redirect_uri: None,
            refresh_token: Some(refresh_token.into()),
        }
    }
}

impl fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRequest")
            .field("client_id", &self.client_id)
            .field("grant_type", &self.grant_type)
            .field("redirect_uri", &self.redirect_uri)
            .finish_non_exhaustive()
    }
}
