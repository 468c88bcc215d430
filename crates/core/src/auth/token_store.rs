//! Persistence of the single token record
//!
//! Every write resolves the readiness signal: storing marks the session
//! authenticated, clearing marks it unauthenticated.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use gcal_common::storage::{KeyValueStore, RecordStoreExt};
use gcal_common::time::Clock;
use gcal_domain::constants::TOKEN_KEY;
use gcal_domain::{AuthError, AuthResult, TokenRecord};
use tracing::{debug, info, warn};

use super::readiness::ReadinessSignal;

/// Store of the persisted [`TokenRecord`].
pub struct TokenStore<S: ?Sized> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    readiness: ReadinessSignal,
    safety_margin: Duration,
}

impl<S: ?Sized> Clone for TokenStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            readiness: self.readiness.clone(),
            safety_margin: self.safety_margin,
        }
    }
}

impl<S: KeyValueStore + ?Sized> TokenStore<S> {
    pub fn new(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        readiness: ReadinessSignal,
        safety_margin: Duration,
    ) -> Self {
        Self { store, clock, readiness, safety_margin }
    }

    /// The stored record, if any.
    ///
    /// # Errors
    /// [`AuthError::CorruptRecord`] if the stored value does not decode.
    pub async fn load(&self) -> AuthResult<Option<TokenRecord>> {
        Ok(self.store.load_record(TOKEN_KEY).await?)
    }

    /// Like [`TokenStore::load`], but a corrupt record is logged and
    /// reported as absent.
    pub async fn load_lenient(&self) -> AuthResult<Option<TokenRecord>> {
        match self.load().await {
            Err(AuthError::CorruptRecord { key, reason }) => {
                warn!(%key, %reason, "Ignoring corrupt token record");
                Ok(None)
            }
            other => other,
        }
    }

    /// Persist `record` and mark the session authenticated.
    ///
    /// A missing refresh token is carried over from the previous record, and
    /// a missing `expires_at` is derived from `expires_in` minus the safety
    /// margin.
    pub async fn store(&self, mut record: TokenRecord) -> AuthResult<TokenRecord> {
        if record.refresh_token.is_none() {
            if let Some(existing) = self.load_lenient().await? {
                if existing.refresh_token.is_some() {
                    debug!("Carrying refresh token over from previous record");
                    record.refresh_token = existing.refresh_token;
                }
            }
        }
        record.normalize_expiry(self.clock.now(), self.safety_margin)?;

        self.store.store_record(TOKEN_KEY, &record).await?;
        self.readiness.set(true);
        debug!(expires_at = ?record.expires_at, "Stored token record");
        Ok(record)
    }

    /// Delete the record and mark the session unauthenticated.
    pub async fn clear(&self) -> AuthResult<()> {
        self.store.delete(TOKEN_KEY).await?;
        self.readiness.set(false);
        info!("Cleared token record");
        Ok(())
    }

    /// Backdate the stored record's expiry to the epoch so the next access
    /// must refresh. No-op without a record.
    ///
    /// Readiness follows whether the expired record can still be refreshed.
    pub async fn force_expire(&self) -> AuthResult<bool> {
        let Some(mut record) = self.load_lenient().await? else {
            return Ok(false);
        };
        record.expires_at = Some(DateTime::<Utc>::UNIX_EPOCH);

        self.store.store_record(TOKEN_KEY, &record).await?;
        self.readiness.set(record.refresh_token.is_some());
        info!("Forced token record expiry");
        Ok(true)
    }
}
