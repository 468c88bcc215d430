//! Provider constants
//!
//! Storage keys, Google endpoints and the lifecycle defaults used when no
//! override is configured.

// Storage keys
pub const TOKEN_KEY: &str = "google-token";
pub const STATE_KEY_PREFIX: &str = "google-state-";

// Google OAuth 2.0 endpoints
pub const GOOGLE_AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";

// Pending authorization attempts
pub const STATE_TTL_MS: i64 = 10 * 60 * 1000;
pub const VERIFIER_LENGTH: usize = 56;
pub const SECURITY_TOKEN_LENGTH: usize = 16;

// Access tokens are treated as expired this long before the provider says so
pub const EXPIRY_SAFETY_MARGIN_MS: i64 = 10_000;

// Readiness observers see a value only after it has been stable this long
pub const READINESS_DEBOUNCE_MS: u64 = 100;

/// Storage key of the pending authorization record for `security_token`.
pub fn state_key(security_token: &str) -> String {
    format!("{STATE_KEY_PREFIX}{security_token}")
}
