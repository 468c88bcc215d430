//! Typed record access on top of a raw [`KeyValueStore`].

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{KeyValueStore, StorageError, StorageResult};

/// JSON record helpers for any [`KeyValueStore`].
///
/// A value that exists but does not decode is reported as
/// [`StorageError::CorruptRecord`], never as a missing record.
#[async_trait]
pub trait RecordStoreExt: KeyValueStore {
    /// Load and decode the record stored under `key`.
    async fn load_record<T>(&self, key: &str) -> StorageResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.get(key).await? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|err| StorageError::corrupt(key, err)),
            None => Ok(None),
        }
    }

    /// Encode `record` as JSON and store it under `key`.
    async fn store_record<T>(&self, key: &str, record: &T) -> StorageResult<()>
    where
        T: Serialize + Sync,
    {
        let raw = serde_json::to_string(record)?;
        self.set(key, raw).await
    }
}

impl<S: KeyValueStore + ?Sized> RecordStoreExt for S {}
