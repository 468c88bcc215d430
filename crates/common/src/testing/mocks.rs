//! Mock implementations for storage-dependent tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::storage::{KeyValueStore, MemoryStore, StorageError, StorageResult};

/// Store that wraps a [`MemoryStore`] and can be switched into failure mode.
///
/// While failing, every operation returns [`StorageError::Backend`].
#[derive(Debug, Clone, Default)]
pub struct FailingStore {
    inner: MemoryStore,
    failing: Arc<AtomicBool>,
}

impl FailingStore {
    /// Create a healthy store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle failure mode.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// The healthy backing store, for seeding and inspection.
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn check(&self) -> StorageResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StorageError::Backend("mock storage failure".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> StorageResult<()> {
        self.check()?;
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.check()?;
        self.inner.delete(key).await
    }

    async fn list_keys(&self) -> StorageResult<Vec<String>> {
        self.check()?;
        self.inner.list_keys().await
    }
}
