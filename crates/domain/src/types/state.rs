//! Pending authorization attempts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One in-flight authorization attempt, persisted between the redirect to
/// the provider and the callback.
///
/// Single use: the record is deleted the first time a callback names its
/// security token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    /// Opaque correlation token echoed back through the OAuth `state`.
    pub security_token: String,
    /// PKCE verifier whose challenge went out in the authorization URL.
    pub verifier_code: String,
    /// Application location to return to once authorization completes.
    pub redirect_url: String,
    /// Absolute expiry. Assigned on issue when absent.
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StateRecord {
    /// New record without an expiry.
    pub fn new(
        security_token: impl Into<String>,
        verifier_code: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            security_token: security_token.into(),
            verifier_code: verifier_code.into(),
            redirect_url: redirect_url.into(),
            expires_at: None,
        }
    }

    /// Whether the record is purge-eligible at `now`. A record without an
    /// expiry counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |at| at <= now)
    }
}
