//! reqwest implementation of the token endpoint port
//!
//! Posts JSON grant requests to the configured token endpoint and maps the
//! provider's answers onto [`AuthError`].

use std::time::Duration;

use async_trait::async_trait;
use gcal_core::TokenEndpoint;
use gcal_domain::types::token::TOKEN_RESPONSE_KEY;
use gcal_domain::{AuthError, AuthResult, OAuthConfig, TokenRequest, TokenResponse};
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

/// Longest slice of a non-JSON error body kept as a description.
const MAX_ERROR_BODY_CHARS: usize = 256;

/// OAuth error body, RFC 6749 section 5.2.
#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Google token endpoint client.
#[derive(Clone)]
pub struct GoogleTokenClient {
    http: ReqwestClient,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    token_endpoint: String,
}

impl GoogleTokenClient {
    /// Client without a request timeout.
    ///
    /// # Errors
    /// Returns [`AuthError::Internal`] if the HTTP client cannot be built.
    pub fn new(config: &OAuthConfig) -> AuthResult<Self> {
        let http = ReqwestClient::builder()
            .build()
            .map_err(|err| AuthError::Internal(format!("failed to build HTTP client: {err}")))?;
        Ok(Self::with_client(config, http))
    }

    /// Client whose requests give up after `timeout`.
    ///
    /// # Errors
    /// Returns [`AuthError::Internal`] if the HTTP client cannot be built.
    pub fn with_timeout(config: &OAuthConfig, timeout: Duration) -> AuthResult<Self> {
        let http = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AuthError::Internal(format!("failed to build HTTP client: {err}")))?;
        Ok(Self::with_client(config, http))
    }

    /// Client sharing an existing reqwest connection pool.
    pub fn with_client(config: &OAuthConfig, http: ReqwestClient) -> Self {
        Self {
            http,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            token_endpoint: config.token_endpoint.clone(),
        }
    }

    async fn post(&self, request: &TokenRequest) -> AuthResult<TokenResponse> {
        let grant = request.grant_type;
        debug!(?grant, url = %self.token_endpoint, "sending token request");

        let response = self
            .http
            .post(&self.token_endpoint)
            .json(request)
            .send()
            .await
            .map_err(|err| {
                warn!(?grant, error = %err, "token request failed");
                AuthError::transport(err)
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(AuthError::transport)?;
        debug!(?grant, %status, "received token response");

        if !status.is_success() {
            let err = provider_error(status, &body);
            warn!(?grant, %status, error = %err, "token endpoint rejected request");
            return Err(err);
        }

        serde_json::from_slice::<TokenResponse>(&body)
            .map_err(|err| AuthError::corrupt(TOKEN_RESPONSE_KEY, err))?
            .validate()
    }
}

#[async_trait]
impl TokenEndpoint for GoogleTokenClient {
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> AuthResult<TokenResponse> {
        let request = TokenRequest::authorization_code(
            &self.client_id,
            &self.client_secret,
            code,
            code_verifier,
            &self.redirect_uri,
        );
        self.post(&request).await
    }

    async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenResponse> {
        let request = TokenRequest::refresh(&self.client_id, &self.client_secret, refresh_token);
        self.post(&request).await
    }
}

fn provider_error(status: StatusCode, body: &[u8]) -> AuthError {
    if let Ok(parsed) = serde_json::from_slice::<OAuthErrorBody>(body) {
        return AuthError::Provider {
            status: status.as_u16(),
            error: parsed.error,
            description: parsed.error_description,
        };
    }

    let text: String = String::from_utf8_lossy(body).chars().take(MAX_ERROR_BODY_CHARS).collect();
    let text = text.trim();
    AuthError::Provider {
        status: status.as_u16(),
        error: status.canonical_reason().unwrap_or("http_error").to_string(),
        description: (!text.is_empty()).then(|| text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for http::token_client.
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn test_config(server: &MockServer) -> OAuthConfig {
        let mut config = OAuthConfig::google(
            "client-id",
            "client-secret",
            "http://127.0.0.1:8085/callback",
            vec!["openid".into()],
        );
        config.token_endpoint = format!("{}/token", server.uri());
        config
    }

    fn test_client(server: &MockServer) -> GoogleTokenClient {
        GoogleTokenClient::with_timeout(&test_config(server), Duration::from_secs(5))
            .expect("http client")
    }

    /// Validates `exchange_code` request shape and response decoding.
    ///
    /// Assertions:
    /// - Ensures the JSON body carries the code, verifier and redirect URI.
    /// - Ensures the token response decodes with its refresh token.
    #[tokio::test]
    async fn test_exchange_code_posts_expected_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "client_id": "client-id",
                "client_secret": "client-secret",
                "grant_type": "authorization_code",
                "code": "auth-code",
                "code_verifier": "verifier",
                "redirect_uri": "http://127.0.0.1:8085/callback"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "a1",
                "token_type": "Bearer",
                "expires_in": 3599,
                "refresh_token": "r1",
                "scope": "openid"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = test_client(&server).exchange_code("auth-code", "verifier").await.unwrap();
        assert_eq!(response.access_token, "a1");
        assert_eq!(response.expires_in, 3599);
        assert_eq!(response.refresh_token.as_deref(), Some("r1"));
    }

    /// Validates `refresh` request shape.
    ///
    /// Assertions:
    /// - Ensures only client credentials, grant type and refresh token are
    ///   sent.
    /// - Ensures a response without a refresh token decodes.
    #[tokio::test]
    async fn test_refresh_posts_expected_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_json(json!({
                "client_id": "client-id",
                "client_secret": "client-secret",
                "grant_type": "refresh_token",
                "refresh_token": "r1"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "a2",
                "token_type": "Bearer",
                "expires_in": 3599
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = test_client(&server).refresh("r1").await.unwrap();
        assert_eq!(response.access_token, "a2");
        assert!(response.refresh_token.is_none());
    }

    /// Validates mapping of OAuth error bodies.
    ///
    /// Assertions:
    /// - Ensures status, error code and description are preserved.
    /// - Ensures `invalid_grant` requires authorization.
    #[tokio::test]
    async fn test_oauth_error_body_maps_to_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Token has been expired or revoked."
            })))
            .mount(&server)
            .await;

        let err = test_client(&server).refresh("stale").await.unwrap_err();
        match &err {
            AuthError::Provider { status, error, description } => {
                assert_eq!(*status, 400);
                assert_eq!(error, "invalid_grant");
                assert_eq!(description.as_deref(), Some("Token has been expired or revoked."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.requires_authorization());
    }

    /// Validates mapping of non-OAuth error bodies.
    ///
    /// Assertions:
    /// - Ensures the HTTP reason phrase stands in for the error code.
    /// - Ensures the raw body becomes the description.
    #[tokio::test]
    async fn test_plain_error_body_maps_to_provider_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        let err = test_client(&server).exchange_code("c", "v").await.unwrap_err();
        match err {
            AuthError::Provider { status, error, description } => {
                assert_eq!(status, 503);
                assert_eq!(error, "Service Unavailable");
                assert_eq!(description.as_deref(), Some("upstream unavailable"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    /// Validates that undecodable success bodies fail closed.
    ///
    /// Assertions:
    /// - Ensures a malformed body is a `CorruptRecord`.
    /// - Ensures an empty access token is a `CorruptRecord`.
    #[tokio::test]
    async fn test_malformed_success_body_is_corrupt() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_json(json!({
                "client_id": "client-id",
                "client_secret": "client-secret",
                "grant_type": "refresh_token",
                "refresh_token": "r-bad-shape"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_json(json!({
                "client_id": "client-id",
                "client_secret": "client-secret",
                "grant_type": "refresh_token",
                "refresh_token": "r-empty"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "",
                "token_type": "Bearer",
                "expires_in": 3599
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        assert!(matches!(
            client.refresh("r-bad-shape").await,
            Err(AuthError::CorruptRecord { ref key, .. }) if key == TOKEN_RESPONSE_KEY
        ));
        assert!(matches!(client.refresh("r-empty").await, Err(AuthError::CorruptRecord { .. })));
    }

    /// Validates that the plain constructor does not cut slow responses short.
    ///
    /// Assertions:
    /// - Ensures a response delayed past the short test timeout still
    ///   decodes through `new`.
    /// - Ensures `with_timeout` gives up on the same delay.
    #[tokio::test]
    async fn test_new_applies_no_request_timeout() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({
                        "access_token": "slow",
                        "token_type": "Bearer",
                        "expires_in": 3599
                    }))
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(&server)
            .await;

        let config = test_config(&server);
        let response = GoogleTokenClient::new(&config).unwrap().refresh("r1").await.unwrap();
        assert_eq!(response.access_token, "slow");

        let bounded = GoogleTokenClient::with_timeout(&config, Duration::from_millis(50)).unwrap();
        assert!(matches!(bounded.refresh("r1").await, Err(AuthError::Transport(_))));
    }

    /// Validates transport failures.
    ///
    /// Assertions:
    /// - Ensures an unreachable endpoint surfaces as `Transport`.
    /// - Ensures the original source error is kept.
    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let server = MockServer::start().await;
        let mut config = test_config(&server);
        drop(server);
        config.token_endpoint = "http://127.0.0.1:9/token".into();

        let client = GoogleTokenClient::with_timeout(&config, Duration::from_secs(2)).unwrap();
        let err = client.refresh("r1").await.unwrap_err();
        assert!(matches!(err, AuthError::Transport(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
