//! Key-value persistence for small serialized records
//!
//! The auth kernel keeps its state in a string-keyed, string-valued store
//! that survives process restarts. [`KeyValueStore`] is the port;
//! [`MemoryStore`] and [`FileStore`] are the bundled backends.

pub mod error;
pub mod file;
pub mod memory;
pub mod record;

use async_trait::async_trait;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use record::RecordStoreExt;

/// Persistent string key-value store.
///
/// Implementations must be safe to share across tasks. Writes to a single
/// key replace the previous value wholesale.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> StorageResult<()>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Enumerate every key currently present.
    async fn list_keys(&self) -> StorageResult<Vec<String>>;
}
