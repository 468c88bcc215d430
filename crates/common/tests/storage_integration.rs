//! Integration tests for the storage module
//!
//! These tests verify end-to-end storage workflows including:
//! - Typed records over both bundled backends
//! - Corruption reporting for individual records and whole files
//! - Concurrent writers against one file store

#![cfg(feature = "runtime")]

use std::sync::Arc;

use gcal_common::error::{ErrorClassification, ErrorSeverity};
use gcal_common::storage::{
    FileStore, KeyValueStore, MemoryStore, RecordStoreExt, StorageError,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Entry {
    id: u32,
    label: String,
}

async fn exercise_records<S: KeyValueStore>(store: &S) {
    let entry = Entry { id: 7, label: "calendar".into() };
    store.store_record("entry-7", &entry).await.unwrap();

    let loaded: Option<Entry> = store.load_record("entry-7").await.unwrap();
    assert_eq!(loaded, Some(entry));

    store.delete("entry-7").await.unwrap();
    let gone: Option<Entry> = store.load_record("entry-7").await.unwrap();
    assert!(gone.is_none());
}

/// Validates typed records over `MemoryStore` and `FileStore`.
///
/// Assertions:
/// - Ensures both backends round a record through store, load and delete.
#[tokio::test]
async fn test_records_on_both_backends() {
    exercise_records(&MemoryStore::new()).await;

    let dir = tempfile::tempdir().unwrap();
    exercise_records(&FileStore::new(dir.path().join("store.json"))).await;
}

/// Validates `load_record` behavior for a corrupt entry in a healthy file.
///
/// Assertions:
/// - Ensures the corrupt key is named in the error.
/// - Ensures other keys in the same file remain readable.
/// - Ensures the error is a non-retryable warning.
#[tokio::test]
async fn test_corrupt_entry_does_not_poison_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("store.json"));
    store.set("bad", "[1, 2".into()).await.unwrap();
    store.store_record("good", &Entry { id: 1, label: "ok".into() }).await.unwrap();

    let err = store.load_record::<Entry>("bad").await.unwrap_err();
    assert!(matches!(err, StorageError::CorruptRecord { ref key, .. } if key == "bad"));
    assert!(!err.is_retryable());
    assert_eq!(err.severity(), ErrorSeverity::Warning);

    let good: Option<Entry> = store.load_record("good").await.unwrap();
    assert_eq!(good.map(|e| e.id), Some(1));
}

/// Validates concurrent writers sharing one `FileStore`.
///
/// Assertions:
/// - Ensures no write is lost when many tasks set distinct keys at once.
#[tokio::test]
async fn test_concurrent_writers_keep_every_key() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStore::new(dir.path().join("store.json")));

    let mut handles = Vec::new();
    for i in 0..16 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.set(&format!("key-{i}"), i.to_string()).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(store.list_keys().await.unwrap().len(), 16);
}
