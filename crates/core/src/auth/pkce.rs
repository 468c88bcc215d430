//! PKCE (Proof Key for Code Exchange) for OAuth 2.0
//!
//! Implements the S256 method of RFC 7636. Verifiers and security tokens
//! are drawn from the unreserved URI alphabet so they travel through query
//! strings and storage keys without escaping.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use sha2::{Digest, Sha256};

/// `[A-Za-z0-9-._~]`, the RFC 3986 unreserved characters.
pub const UNRESERVED_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// Challenge method sent alongside every challenge.
pub const CHALLENGE_METHOD: &str = "S256";

/// Random string of `length` characters from [`UNRESERVED_ALPHABET`].
///
/// Uses the thread-local CSPRNG.
pub fn random_unreserved(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(UNRESERVED_ALPHABET[rng.gen_range(0..UNRESERVED_ALPHABET.len())]))
        .collect()
}

/// BASE64URL(SHA256(ASCII(verifier))) without padding.
pub fn derive_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

/// Opaque correlation token for one authorization attempt.
pub fn generate_security_token(length: usize) -> String {
    random_unreserved(length)
}

/// Verifier and its derived challenge.
///
/// The verifier stays local until the code exchange; only the challenge
/// goes out in the authorization URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkcePair {
    pub verifier: String,
    pub challenge: String,
}

impl PkcePair {
    /// Fresh pair with a verifier of `verifier_length` characters.
    ///
    /// ```
    /// use gcal_core::auth::pkce::PkcePair;
    ///
    /// let pair = PkcePair::generate(56);
    /// assert_eq!(pair.verifier.len(), 56);
    /// assert_eq!(pair.challenge.len(), 43);
    /// ```
    pub fn generate(verifier_length: usize) -> Self {
        let verifier = random_unreserved(verifier_length);
        let challenge = derive_challenge(&verifier);
        Self { verifier, challenge }
    }

    /// Always `"S256"`.
    #[must_use]
    pub fn challenge_method(&self) -> &'static str {
        CHALLENGE_METHOD
    }
}
