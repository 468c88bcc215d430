//! Application context - wires configuration, storage and the manager

use std::path::PathBuf;
use std::sync::Arc;

use gcal_common::storage::FileStore;
use gcal_core::{TokenEndpoint, TokenLifecycleManager};
use gcal_domain::{AuthResult, OAuthConfig};
use gcal_infra::GoogleTokenClient;
use tracing::debug;

/// Manager over the file-backed store with a type-erased token endpoint.
pub type AppManager = TokenLifecycleManager<dyn TokenEndpoint, FileStore>;

/// Everything a command needs.
pub struct AppContext {
    pub config: OAuthConfig,
    pub store: Arc<FileStore>,
    pub manager: AppManager,
}

impl AppContext {
    /// Context talking to the configured token endpoint.
    ///
    /// # Errors
    /// Fails on invalid configuration or if the HTTP client cannot be
    /// built.
    pub async fn new(config: OAuthConfig, store_path: impl Into<PathBuf>) -> AuthResult<Self> {
        let endpoint: Arc<dyn TokenEndpoint> = Arc::new(GoogleTokenClient::new(&config)?);
        Self::with_endpoint(config, store_path, endpoint).await
    }

    /// Context over a caller-supplied token endpoint.
    ///
    /// Returns once the startup probe has settled readiness.
    pub async fn with_endpoint(
        config: OAuthConfig,
        store_path: impl Into<PathBuf>,
        endpoint: Arc<dyn TokenEndpoint>,
    ) -> AuthResult<Self> {
        let store = Arc::new(FileStore::new(store_path));
        debug!(path = %store.path().display(), "Opening token store");

        let manager = TokenLifecycleManager::new(config.clone(), endpoint, Arc::clone(&store))?;
        manager.wait_until_probed().await;
        Ok(Self { config, store, manager })
    }
}
