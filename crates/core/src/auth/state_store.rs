//! Pending authorization attempts
//!
//! Records are single use and short lived. Expired records are swept lazily
//! whenever a record is looked up; there is no background timer.

use std::sync::Arc;

use chrono::Duration;
use gcal_common::storage::{KeyValueStore, RecordStoreExt};
use gcal_common::time::Clock;
use gcal_domain::constants::{state_key, STATE_KEY_PREFIX};
use gcal_domain::{AuthError, AuthResult, StateRecord};
use tracing::{debug, warn};

/// Store of [`StateRecord`]s keyed by security token.
pub struct StateRecordStore<S: ?Sized> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl<S: ?Sized> Clone for StateRecordStore<S> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store), clock: Arc::clone(&self.clock), ttl: self.ttl }
    }
}

impl<S: KeyValueStore + ?Sized> StateRecordStore<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { store, clock, ttl }
    }

    /// Persist `record`, assigning `expires_at = now + ttl` if unset.
    pub async fn issue(&self, mut record: StateRecord) -> AuthResult<StateRecord> {
        if record.expires_at.is_none() {
            record.expires_at = Some(self.clock.now() + self.ttl);
        }
        self.store.store_record(&state_key(&record.security_token), &record).await?;
        debug!("Issued authorization state record");
        Ok(record)
    }

    /// Sweep, then look up the record for `security_token` without
    /// consuming it.
    pub async fn lookup(&self, security_token: &str) -> AuthResult<Option<StateRecord>> {
        self.sweep_expired().await?;
        let key = state_key(security_token);
        match self.store.load_record::<StateRecord>(&key).await {
            Ok(record) => Ok(record),
            Err(err) => match AuthError::from(err) {
                AuthError::CorruptRecord { key, reason } => {
                    warn!(%key, %reason, "Ignoring corrupt authorization state record");
                    Ok(None)
                }
                other => Err(other),
            },
        }
    }

    /// Look up and unconditionally delete the record for `security_token`.
    ///
    /// The delete happens even when nothing usable was found, so a replayed
    /// callback can never succeed.
    pub async fn consume(&self, security_token: &str) -> AuthResult<Option<StateRecord>> {
        let found = self.lookup(security_token).await?;
        self.store.delete(&state_key(security_token)).await?;
        Ok(found)
    }

    /// Delete every state record that is expired or undecodable.
    ///
    /// Returns how many records were removed.
    pub async fn sweep_expired(&self) -> AuthResult<usize> {
        let now = self.clock.now();
        let mut removed = 0;

        for key in self.store.list_keys().await? {
            if !key.starts_with(STATE_KEY_PREFIX) {
                continue;
            }
            let purge = match self.store.load_record::<StateRecord>(&key).await {
                Ok(Some(record)) => record.is_expired_at(now),
                Ok(None) => false,
                Err(err) => {
                    warn!(%key, error = %err, "Purging corrupt authorization state record");
                    true
                }
            };
            if purge {
                self.store.delete(&key).await?;
                removed += 1;
            }
        }

        if removed > 0 {
            debug!(removed, "Swept expired authorization state records");
        }
        Ok(removed)
    }
}
