//! Token lifecycle manager
//!
//! Orchestrates the authorization-code flow and token upkeep:
//! - Authorization link generation (PKCE pair + pending state record)
//! - Callback completion and code exchange
//! - Transparent refresh of expired access tokens, shared by concurrent
//!   callers
//! - Readiness tracking, seeded by a startup probe of stored tokens

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use gcal_common::storage::KeyValueStore;
use gcal_common::time::{Clock, SystemClock};
use gcal_domain::{
    AuthError, AuthResult, ManagerSettings, OAuthConfig, Readiness, StateRecord, TokenRecord,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use super::callback::{encode_state, CallbackParams};
use super::pkce::{generate_security_token, PkcePair};
use super::ports::TokenEndpoint;
use super::readiness::{ReadinessSignal, ReadinessSubscription};
use super::state_store::StateRecordStore;
use super::token_store::TokenStore;

type SharedRefresh = Shared<BoxFuture<'static, AuthResult<TokenRecord>>>;
type SharedProbe = Shared<BoxFuture<'static, ()>>;

/// Classification of the stored token at a point in time.
#[derive(Clone)]
pub enum TokenAvailability {
    /// No record, or an expired record that cannot be refreshed.
    None,
    /// A record whose access token is still valid.
    Available(TokenRecord),
    /// An expired record that carries a refresh token.
    NeedsRefresh(String),
}

impl TokenAvailability {
    /// Whether a header can be produced without user interaction.
    pub fn is_usable(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Available(_) => "available",
            Self::NeedsRefresh(_) => "needs_refresh",
        }
    }
}

impl std::fmt::Debug for TokenAvailability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

struct InFlightRefresh {
    id: u64,
    shared: SharedRefresh,
}

struct Inner<E: ?Sized, S: ?Sized> {
    config: OAuthConfig,
    settings: ManagerSettings,
    endpoint: Arc<E>,
    clock: Arc<dyn Clock>,
    states: StateRecordStore<S>,
    tokens: TokenStore<S>,
    readiness: ReadinessSignal,
    in_flight: Arc<Mutex<Option<InFlightRefresh>>>,
    refresh_seq: AtomicU64,
    probe: Mutex<Option<SharedProbe>>,
}

/// Owns the OAuth session for one Google account.
///
/// Cheap to clone; clones share state, including any in-flight refresh.
pub struct TokenLifecycleManager<E: ?Sized, S: ?Sized> {
    inner: Arc<Inner<E, S>>,
}

impl<E: ?Sized, S: ?Sized> Clone for TokenLifecycleManager<E, S> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<E, S> TokenLifecycleManager<E, S>
where
    E: TokenEndpoint + ?Sized + 'static,
    S: KeyValueStore + ?Sized + 'static,
{
    /// Manager with default settings and the system clock.
    ///
    /// # Errors
    /// Returns [`AuthError::Config`] for an invalid configuration and
    /// [`AuthError::Internal`] outside a Tokio runtime.
    pub fn new(config: OAuthConfig, endpoint: Arc<E>, store: Arc<S>) -> AuthResult<Self> {
        Self::with_parts(config, ManagerSettings::default(), endpoint, store, Arc::new(SystemClock))
    }

    /// Manager with every collaborator supplied by the caller.
    ///
    /// Spawns the startup probe that seeds readiness from the stored token.
    ///
    /// # Errors
    /// Returns [`AuthError::Config`] for an invalid configuration and
    /// [`AuthError::Internal`] outside a Tokio runtime.
    pub fn with_parts(
        config: OAuthConfig,
        settings: ManagerSettings,
        endpoint: Arc<E>,
        store: Arc<S>,
        clock: Arc<dyn Clock>,
    ) -> AuthResult<Self> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|err| AuthError::Internal(format!("no Tokio runtime: {err}")))?;

        let readiness = ReadinessSignal::new(settings.readiness_debounce);
        let states =
            StateRecordStore::new(Arc::clone(&store), Arc::clone(&clock), settings.state_ttl);
        let tokens = TokenStore::new(
            store,
            Arc::clone(&clock),
            readiness.clone(),
            settings.expiry_safety_margin,
        );

        let manager = Self {
            inner: Arc::new(Inner {
                config,
                settings,
                endpoint,
                clock,
                states,
                tokens,
                readiness,
                in_flight: Arc::new(Mutex::new(None)),
                refresh_seq: AtomicU64::new(0),
                probe: Mutex::new(None),
            }),
        };
        manager.start_probe(&runtime);
        Ok(manager)
    }

    fn start_probe(&self, runtime: &tokio::runtime::Handle) {
        let inner = Arc::clone(&self.inner);
        let task = runtime.spawn(async move {
            let usable = match inner.classify().await {
                Ok(availability) => {
                    debug!(availability = availability.label(), "Startup token probe finished");
                    availability.is_usable()
                }
                Err(err) => {
                    warn!(error = %err, "Startup token probe failed");
                    false
                }
            };
            inner.readiness.resolve_initial(usable);
        });
        let probe = async move {
            if let Err(err) = task.await {
                warn!(error = %err, "Startup token probe task aborted");
            }
        }
        .boxed()
        .shared();
        *self.inner.probe.lock() = Some(probe);
    }

    /// Wait for the startup probe to finish.
    pub async fn wait_until_probed(&self) {
        let probe = self.inner.probe.lock().clone();
        if let Some(probe) = probe {
            probe.await;
        }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.inner.config
    }

    /// Current undebounced readiness.
    pub fn readiness(&self) -> Readiness {
        self.inner.readiness.current()
    }

    /// Debounced, de-duplicated readiness observer.
    pub fn subscribe(&self) -> ReadinessSubscription {
        self.inner.readiness.subscribe()
    }

    /// Classify the stored token without refreshing it.
    pub async fn availability(&self) -> AuthResult<TokenAvailability> {
        self.inner.classify().await
    }

    /// Start an authorization attempt.
    ///
    /// Creates a PKCE pair and a security token, records the attempt
    /// together with `return_to` (where the application should land after
    /// authorization), and returns the provider URL to send the user to.
    pub async fn authorization_link(&self, return_to: &str) -> AuthResult<Url> {
        let settings = &self.inner.settings;
        let config = &self.inner.config;

        let pkce = PkcePair::generate(settings.verifier_length);
        let security_token = generate_security_token(settings.security_token_length);
        self.inner
            .states
            .issue(StateRecord::new(security_token.as_str(), pkce.verifier.as_str(), return_to))
            .await?;

        let mut url = Url::parse(&config.authorization_endpoint)
            .map_err(|err| AuthError::Config(format!("authorization_endpoint: {err}")))?;
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &config.client_id)
            .append_pair("scope", &config.scope_string())
            .append_pair("redirect_uri", &config.redirect_uri)
            .append_pair("code_challenge", &pkce.challenge)
            .append_pair("code_challenge_method", pkce.challenge_method())
            .append_pair("state", &encode_state(&security_token))
            // Both are needed for Google to issue a refresh token every time.
            .append_pair("prompt", "consent")
            .append_pair("access_type", "offline");

        info!("Created authorization link");
        Ok(url)
    }

    /// Complete an authorization attempt.
    ///
    /// The pending record for `security_token` is consumed before anything
    /// else, so it is gone whatever the outcome. A non-empty
    /// `provider_error` then fails with [`AuthError::AuthorizationResponse`].
    /// On success the tokens are stored and the consumed record is returned
    /// so the caller can navigate to its `redirect_url`.
    pub async fn exchange_code_for_token(
        &self,
        code: &str,
        security_token: &str,
        provider_error: Option<&str>,
    ) -> AuthResult<StateRecord> {
        let state = self.inner.states.consume(security_token).await?;

        if let Some(message) = provider_error.filter(|m| !m.is_empty()) {
            warn!(error = message, "Provider reported an authorization error");
            return Err(AuthError::AuthorizationResponse(message.to_string()));
        }
        let state =
            state.ok_or_else(|| AuthError::SecurityTokenNotFound(security_token.to_string()))?;

        info!("Exchanging authorization code for tokens");
        let response = self.inner.endpoint.exchange_code(code, &state.verifier_code).await?;
        self.inner.tokens.store(TokenRecord::from(response)).await?;
        info!("Authorization completed");
        Ok(state)
    }

    /// Complete an authorization attempt from parsed callback parameters.
    pub async fn complete_callback(&self, params: &CallbackParams) -> AuthResult<StateRecord> {
        let security_token = params
            .security_token
            .as_deref()
            .ok_or_else(|| AuthError::InvalidCallback("missing security token in state".into()))?;

        match (params.code.as_deref(), params.error.as_deref()) {
            (code, Some(error)) => {
                self.exchange_code_for_token(code.unwrap_or_default(), security_token, Some(error))
                    .await
            }
            (Some(code), None) => self.exchange_code_for_token(code, security_token, None).await,
            (None, None) => Err(AuthError::InvalidCallback("missing authorization code".into())),
        }
    }

    /// A valid access token, refreshing first if needed.
    ///
    /// `Ok(None)` when there is no usable token. Refresh failures
    /// propagate.
    pub async fn get_access_token(&self) -> AuthResult<Option<String>> {
        Ok(self.usable_token().await?.map(|record| record.access_token))
    }

    /// `"<token_type> <access_token>"`, refreshing first if needed.
    ///
    /// # Errors
    /// [`AuthError::AccessTokenNotFound`] when there is no usable token.
    pub async fn get_authorization_header(&self) -> AuthResult<String> {
        self.usable_token()
            .await?
            .map(|record| record.authorization_header())
            .ok_or(AuthError::AccessTokenNotFound)
    }

    /// Expire the stored token so the next access refreshes it.
    ///
    /// Returns whether a record existed.
    pub async fn force_expire(&self) -> AuthResult<bool> {
        self.inner.tokens.force_expire().await
    }

    /// Delete the stored token.
    pub async fn logout(&self) -> AuthResult<()> {
        self.inner.tokens.clear().await
    }

    async fn usable_token(&self) -> AuthResult<Option<TokenRecord>> {
        match self.inner.classify().await? {
            TokenAvailability::Available(record) => Ok(Some(record)),
            TokenAvailability::NeedsRefresh(refresh_token) => {
                self.inner.refresh(refresh_token).await.map(Some)
            }
            TokenAvailability::None => Ok(None),
        }
    }
}

impl<E, S> Inner<E, S>
where
    E: TokenEndpoint + ?Sized + 'static,
    S: KeyValueStore + ?Sized + 'static,
{
    async fn classify(&self) -> AuthResult<TokenAvailability> {
        let Some(record) = self.tokens.load_lenient().await? else {
            return Ok(TokenAvailability::None);
        };
        if record.is_valid_at(self.clock.now()) {
            return Ok(TokenAvailability::Available(record));
        }
        Ok(match record.refresh_token {
            Some(refresh_token) => TokenAvailability::NeedsRefresh(refresh_token),
            None => TokenAvailability::None,
        })
    }

    /// Join the refresh already in flight, or start one.
    ///
    /// The refresh runs on its own task so it completes even if every
    /// caller stops waiting. The slot is cleared when it settles. A caller
    /// whose classification predates a refresh that has already settled
    /// gets the stored token instead of a second request.
    fn refresh(&self, refresh_token: String) -> SharedRefresh {
        let mut slot = self.in_flight.lock();
        if let Some(existing) = slot.as_ref() {
            debug!(refresh_id = existing.id, "Joining in-flight token refresh");
            return existing.shared.clone();
        }

        let id = self.refresh_seq.fetch_add(1, Ordering::Relaxed);
        let endpoint = Arc::clone(&self.endpoint);
        let tokens = self.tokens.clone();
        let clock = Arc::clone(&self.clock);
        let in_flight = Arc::clone(&self.in_flight);

        let task = tokio::spawn(async move {
            let result = match tokens.load_lenient().await {
                Ok(Some(current)) if current.is_valid_at(clock.now()) => {
                    debug!(refresh_id = id, "Stored token already refreshed");
                    Ok(current)
                }
                Ok(_) => {
                    info!(refresh_id = id, "Refreshing access token");
                    match endpoint.refresh(&refresh_token).await {
                        Ok(response) => tokens.store(TokenRecord::from(response)).await,
                        Err(err) => Err(err),
                    }
                }
                Err(err) => Err(err),
            };
            match &result {
                Ok(_) => info!(refresh_id = id, "Access token refreshed"),
                Err(err) => warn!(refresh_id = id, error = %err, "Token refresh failed"),
            }

            let mut slot = in_flight.lock();
            if slot.as_ref().is_some_and(|current| current.id == id) {
                *slot = None;
            }
            result
        });

        let shared = async move {
            task.await.unwrap_or_else(|err| {
                Err(AuthError::Internal(format!("token refresh task failed: {err}")))
            })
        }
        .boxed()
        .shared();
        *slot = Some(InFlightRefresh { id, shared: shared.clone() });
        shared
    }
}
