//! Read-through TTL cache over a [`CreatureStore`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, instrument, warn};

use creature_core::error::Result;
use creature_core::traits::CreatureStore;
use creature_core::types::{Creature, CreatureId, CreatureLookupResult};

use crate::config::{CacheConfig, LockMode};
use crate::locks::FetchLocks;

/// A lookup result and the moment it was confirmed by the store.
#[derive(Clone)]
struct CacheEntry {
    result: CreatureLookupResult,
    stored_at: Instant,
}

impl CacheEntry {
    fn new(result: CreatureLookupResult) -> Self {
        Self {
            result,
            stored_at: Instant::now(),
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

/// Read-through cache for creature lookups.
///
/// Both found and not-found results are cached for the same TTL. Expiry is
/// lazy: a stale entry stays in the map until the next lookup of its key
/// replaces it.
///
/// # Locking
///
/// A lookup first checks the entry map under a shared lock. On a miss it takes
/// the fetch lock for the key (see [`LockMode`]), checks again, and only then
/// calls the store. Callers that queued behind the fetch find the refreshed
/// entry on their second check, so one round-trip serves all of them.
///
/// Store failures are returned as-is and never cached; an expired entry is left
/// in place when its refresh fails.
pub struct CachingCreatureRepo<S> {
    store: S,
    entries: RwLock<HashMap<CreatureId, CacheEntry>>,
    fetch_locks: FetchLocks,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    store_errors: AtomicU64,
}

impl<S: CreatureStore> CachingCreatureRepo<S> {
    /// Creates a cache over `store` with the given TTL and per-key fetch locks.
    pub fn new(store: S, ttl: Duration) -> Self {
        Self::with_config(store, CacheConfig::default().with_ttl(ttl))
    }

    /// Creates a cache with custom configuration.
    pub fn with_config(store: S, config: CacheConfig) -> Self {
        Self {
            store,
            entries: RwLock::new(HashMap::new()),
            fetch_locks: FetchLocks::new(config.lock_mode),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            store_errors: AtomicU64::new(0),
        }
    }

    /// Returns the TTL applied to every entry.
    pub fn ttl(&self) -> Duration {
        self.config.ttl()
    }

    /// Returns the fetch lock granularity.
    pub fn lock_mode(&self) -> LockMode {
        self.config.lock_mode
    }

    /// Returns the wrapped store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the number of cached entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let ttl = self.ttl();
        let entries = self.entries.read();
        let expired = entries.values().filter(|e| !e.is_fresh(ttl)).count();

        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
            total_entries: entries.len(),
            expired_entries: expired,
            valid_entries: entries.len() - expired,
        }
    }

    fn fresh_lookup(&self, id: CreatureId) -> Option<CreatureLookupResult> {
        let ttl = self.ttl();
        let entries = self.entries.read();
        entries
            .get(&id)
            .filter(|entry| entry.is_fresh(ttl))
            .map(|entry| entry.result.clone())
    }

    fn store_entry(&self, id: CreatureId, result: CreatureLookupResult) {
        self.entries.write().insert(id, CacheEntry::new(result));
    }
}

#[async_trait]
impl<S: CreatureStore> CreatureStore for CachingCreatureRepo<S> {
    /// Creates through the store, then caches the new creature under its id.
    #[instrument(skip(self, description))]
    async fn create_creature(&self, name: &str, description: &str) -> Result<Creature> {
        let creature = self.store.create_creature(name, description).await?;

        // A lookup of this id already in flight must write before we do
        let _fetch = self.fetch_locks.acquire(creature.id).await;
        self.store_entry(creature.id, CreatureLookupResult::Found(creature.clone()));
        debug!(id = creature.id, "Cached created creature");

        Ok(creature)
    }

    /// Serves fresh entries from memory and reads through on a miss.
    #[instrument(skip(self))]
    async fn get_creature(&self, id: CreatureId) -> Result<CreatureLookupResult> {
        if let Some(result) = self.fresh_lookup(id) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(id, "Cache hit");
            return Ok(result);
        }

        let _fetch = self.fetch_locks.acquire(id).await;

        // Another caller may have refreshed the entry while we waited
        if let Some(result) = self.fresh_lookup(id) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(id, "Cache hit after waiting on fetch");
            return Ok(result);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(id, "Cache miss, querying store");

        let result = match self.store.get_creature(id).await {
            Ok(result) => result,
            Err(e) => {
                self.store_errors.fetch_add(1, Ordering::Relaxed);
                warn!(id, error = %e, "Store lookup failed");
                return Err(e);
            }
        };

        self.store_entry(id, result.clone());
        debug!(id, found = result.is_found(), "Cached store result");

        Ok(result)
    }
}

/// Cache statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from memory
    pub hits: u64,
    /// Lookups that went to the store
    pub misses: u64,
    /// Store lookups that failed
    pub store_errors: u64,
    /// Entries in the map (including expired)
    pub total_entries: usize,
    /// Entries past their TTL
    pub expired_entries: usize,
    /// Entries still within their TTL
    pub valid_entries: usize,
}
