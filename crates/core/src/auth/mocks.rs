//! Scriptable [`TokenEndpoint`] for tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use gcal_domain::{AuthError, AuthResult, TokenResponse};
use parking_lot::Mutex;
use tokio::sync::watch;

use super::ports::TokenEndpoint;

/// One recorded code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeCall {
    pub code: String,
    pub code_verifier: String,
}

#[derive(Default)]
struct Script {
    exchange: VecDeque<AuthResult<TokenResponse>>,
    refresh: VecDeque<AuthResult<TokenResponse>>,
    exchange_calls: Vec<ExchangeCall>,
    refresh_calls: Vec<String>,
}

/// Mock token endpoint with queued responses and call recording.
///
/// Refreshes can be held open with [`MockTokenEndpoint::hold_refreshes`]
/// to exercise concurrent callers.
#[derive(Clone)]
pub struct MockTokenEndpoint {
    script: Arc<Mutex<Script>>,
    gate: Arc<watch::Sender<bool>>,
}

impl Default for MockTokenEndpoint {
    fn default() -> Self {
        let (gate, _rx) = watch::channel(true);
        Self { script: Arc::new(Mutex::new(Script::default())), gate: Arc::new(gate) }
    }
}

impl MockTokenEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canned successful response.
    pub fn token_response(access_token: &str, refresh_token: Option<&str>) -> TokenResponse {
        TokenResponse {
            access_token: access_token.to_string(),
            token_type: "Bearer".to_string(),
            expires_in: 3600,
            refresh_token: refresh_token.map(str::to_string),
            scope: None,
            id_token: None,
        }
    }

    /// Queue the result of the next code exchange.
    pub fn push_exchange(&self, result: AuthResult<TokenResponse>) {
        self.script.lock().exchange.push_back(result);
    }

    /// Queue the result of the next refresh.
    pub fn push_refresh(&self, result: AuthResult<TokenResponse>) {
        self.script.lock().refresh.push_back(result);
    }

    pub fn exchange_calls(&self) -> Vec<ExchangeCall> {
        self.script.lock().exchange_calls.clone()
    }

    /// Refresh tokens passed to every refresh so far.
    pub fn refresh_calls(&self) -> Vec<String> {
        self.script.lock().refresh_calls.clone()
    }

    /// Make refreshes wait until [`MockTokenEndpoint::release_refreshes`].
    pub fn hold_refreshes(&self) {
        self.gate.send_replace(false);
    }

    pub fn release_refreshes(&self) {
        self.gate.send_replace(true);
    }

    fn unscripted(kind: &str) -> AuthError {
        AuthError::Internal(format!("no scripted {kind} response"))
    }
}

#[async_trait]
impl TokenEndpoint for MockTokenEndpoint {
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> AuthResult<TokenResponse> {
        let mut script = self.script.lock();
        script.exchange_calls.push(ExchangeCall {
            code: code.to_string(),
            code_verifier: code_verifier.to_string(),
        });
        script.exchange.pop_front().unwrap_or_else(|| Err(Self::unscripted("exchange")))
    }

    async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenResponse> {
        self.script.lock().refresh_calls.push(refresh_token.to_string());

        let mut open = self.gate.subscribe();
        open.wait_for(|open| *open)
            .await
            .map_err(|_| AuthError::Internal("refresh gate closed".into()))?;

        self.script.lock().refresh.pop_front().unwrap_or_else(|| Err(Self::unscripted("refresh")))
    }
}
