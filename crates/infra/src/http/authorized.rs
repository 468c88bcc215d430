//! Requests against protected resource APIs

use std::sync::Arc;

use gcal_common::storage::KeyValueStore;
use gcal_core::{TokenEndpoint, TokenLifecycleManager};
use gcal_domain::AuthResult;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client as ReqwestClient, IntoUrl, Method, RequestBuilder};

/// reqwest client that signs every request with the manager's current
/// authorization header, refreshing the token first when needed.
pub struct AuthorizedClient<E: ?Sized, S: ?Sized> {
    http: ReqwestClient,
    manager: TokenLifecycleManager<E, S>,
}

impl<E: ?Sized, S: ?Sized> Clone for AuthorizedClient<E, S> {
    fn clone(&self) -> Self {
        Self { http: self.http.clone(), manager: self.manager.clone() }
    }
}

impl<E, S> AuthorizedClient<E, S>
where
    E: TokenEndpoint + ?Sized + 'static,
    S: KeyValueStore + ?Sized + 'static,
{
    pub fn new(http: ReqwestClient, manager: TokenLifecycleManager<E, S>) -> Self {
        Self { http, manager }
    }

    pub fn manager(&self) -> &TokenLifecycleManager<E, S> {
        &self.manager
    }

    /// Request builder with the `Authorization` header attached.
    ///
    /// # Errors
    /// [`gcal_domain::AuthError::AccessTokenNotFound`] when no usable token
    /// exists, or whatever the refresh failed with.
    pub async fn request<U: IntoUrl>(&self, method: Method, url: U) -> AuthResult<RequestBuilder> {
        let header = self.manager.get_authorization_header().await?;
        Ok(self.http.request(method, url).header(AUTHORIZATION, header))
    }

    pub async fn get<U: IntoUrl>(&self, url: U) -> AuthResult<RequestBuilder> {
        self.request(Method::GET, url).await
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for http::authorized.
    use gcal_common::storage::MemoryStore;
    use gcal_core::MockTokenEndpoint;
    use gcal_domain::{AuthError, OAuthConfig};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn manager(
        endpoint: &MockTokenEndpoint,
    ) -> TokenLifecycleManager<MockTokenEndpoint, MemoryStore> {
        let config = OAuthConfig::google(
            "client-id",
            "client-secret",
            "http://127.0.0.1:8085/callback",
            vec!["https://www.googleapis.com/auth/calendar".into()],
        );
        TokenLifecycleManager::new(config, Arc::new(endpoint.clone()), Arc::new(MemoryStore::new()))
            .unwrap()
    }

    /// Validates `AuthorizedClient::get` after a completed login.
    ///
    /// Assertions:
    /// - Ensures the protected resource sees the bearer header.
    #[tokio::test]
    async fn test_request_carries_bearer_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .and(header("authorization", "Bearer a1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = MockTokenEndpoint::new();
        endpoint.push_exchange(Ok(MockTokenEndpoint::token_response("a1", Some("r1"))));
        let manager = manager(&endpoint);
        manager.wait_until_probed().await;

        let link = manager.authorization_link("/").await.unwrap();
        let state = link
            .query_pairs()
            .find(|(key, _)| key == "state")
            .map(|(_, value)| value.into_owned())
            .unwrap();
        let params = gcal_core::CallbackParams::from_pairs([("code", "c1"), ("state", state.as_str())]);
        manager.complete_callback(&params).await.unwrap();

        let client = AuthorizedClient::new(ReqwestClient::new(), manager);
        let response = client
            .get(format!("{}/calendars/primary/events", server.uri()))
            .await
            .unwrap()
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
    }

    /// Validates `AuthorizedClient::request` without a token.
    ///
    /// Assertions:
    /// - Ensures `AccessTokenNotFound` is returned before any request is
    ///   built.
    #[tokio::test]
    async fn test_request_without_token_fails() {
        let endpoint = MockTokenEndpoint::new();
        let client = AuthorizedClient::new(ReqwestClient::new(), manager(&endpoint));
        client.manager().wait_until_probed().await;

        assert!(matches!(
            client.request(Method::GET, "http://127.0.0.1:9/").await,
            Err(AuthError::AccessTokenNotFound)
        ));
    }
}
