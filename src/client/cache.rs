//! Expiring cache for license check results.
//!
//! A successful `slm_check` is cached for 24 hours so that routine
//! entitlement checks do not hit the license server. [`StoreTtlCache`]
//! layers expiry on top of any [`KeyValueStore`]: each entry is stored as a
//! small JSON envelope carrying its expiry time, and expired or unreadable
//! envelopes are treated as misses.

use crate::client::storage::{KeyValueStore, MemoryStore};
use crate::clock::{Clock, SystemClock};
use crate::errors::LicenseResult;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How long a successful check stays cached.
pub const LICENSE_DATA_TTL_HOURS: i64 = 24;

/// Key-value cache whose entries expire on their own.
#[async_trait]
pub trait TtlCache: Send + Sync {
    /// Read a live entry together with its expiry. Expired entries read as
    /// `None`.
    async fn get(&self, key: &str) -> LicenseResult<Option<CacheEntry>>;

    /// Write an entry that expires after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> LicenseResult<()>;

    /// Drop an entry. Dropping an absent entry is not an error.
    async fn delete(&self, key: &str) -> LicenseResult<()>;
}

/// A cached value and the instant it stops being served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

/// TTL cache backed by a [`KeyValueStore`].
pub struct StoreTtlCache<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: KeyValueStore> StoreTtlCache<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Judge expiry against `clock` instead of the system clock.
    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }
}

impl StoreTtlCache<MemoryStore> {
    /// Process-local cache.
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self::with_clock(MemoryStore::new(), clock)
    }
}

#[async_trait]
impl<S: KeyValueStore> TtlCache for StoreTtlCache<S> {
    async fn get(&self, key: &str) -> LicenseResult<Option<CacheEntry>> {
        let raw = match self.store.get(key).await? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!(key, error = %e, "dropping unreadable cache entry");
                self.store.delete(key).await?;
                return Ok(None);
            }
        };

        if self.clock.now() >= entry.expires_at {
            self.store.delete(key).await?;
            return Ok(None);
        }

        Ok(Some(entry))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> LicenseResult<()> {
        let entry = CacheEntry {
            value: value.to_string(),
            expires_at: self.clock.now() + ttl,
        };
        let raw = serde_json::to_string(&entry)?;
        self.store.set(key, &raw).await
    }

    async fn delete(&self, key: &str) -> LicenseResult<()> {
        self.store.delete(key).await
    }
}
