//! Cache Store Module
//!
//! Main cache engine: a HashMap of entries behind one reader/writer lock, with
//! lazy expiration on every read path and an optional background sweeper.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;

use crate::cache::stats::StatsRecorder;
use crate::cache::{CacheStats, Entry, Value};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::tasks::{Purge, Sweeper};

/// Hook invoked with the key and value of every entry the store removes.
pub type EvictionCallback<V> = Arc<dyn Fn(&str, V) + Send + Sync>;

// == TTL Policy ==
/// How long a written entry should live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ttl {
    /// Use the store's default TTL
    #[default]
    Default,
    /// Never expire, whatever the default
    Never,
    /// Expire after the given duration; zero means never
    After(Duration),
}

impl From<Duration> for Ttl {
    fn from(ttl: Duration) -> Self {
        Ttl::After(ttl)
    }
}

// == Shared State ==
pub(super) struct StoreState<V> {
    pub(super) entries: HashMap<String, Entry<V>>,
    on_evicted: Option<EvictionCallback<V>>,
}

/// Everything the sweeper needs to reach; owned by the [`Store`] handle.
pub(crate) struct Shared<V> {
    pub(super) state: RwLock<StoreState<V>>,
    /// None = entries written with [`Ttl::Default`] never expire
    default_ttl: Option<Duration>,
    stats: StatsRecorder,
}

impl<V> Shared<V> {
    /// Hands removed pairs to the callback. Must be called with the lock released.
    fn notify(&self, callback: Option<EvictionCallback<V>>, evicted: Vec<(String, V)>) {
        self.stats.record_evictions(evicted.len());
        if let Some(callback) = callback {
            for (key, value) in evicted {
                callback(&key, value);
            }
        }
    }
}

impl<V: Send + Sync> Purge for Shared<V> {
    fn purge_expired(&self) -> usize {
        let now = Utc::now();

        // Collect under the lock, notify after releasing it
        let (evicted, callback) = {
            let mut state = self.state.write();
            let expired_keys: Vec<String> = state
                .entries
                .iter()
                .filter(|(_, entry)| entry.is_expired_at(now))
                .map(|(key, _)| key.clone())
                .collect();

            let evicted: Vec<(String, V)> = expired_keys
                .into_iter()
                .filter_map(|key| state.entries.remove_entry(&key))
                .map(|(key, entry)| (key, entry.value))
                .collect();

            (evicted, state.on_evicted.clone())
        };

        let count = evicted.len();
        self.stats.record_expired(count);
        self.notify(callback, evicted);
        count
    }
}

// == Cache Store ==
/// Thread-safe key-value store with per-entry TTL.
///
/// Reads take the shared lock and treat expired entries as absent without
/// removing them. Writes take the exclusive lock. Expired entries are
/// physically reclaimed by [`Store::purge_expired`], either called directly or
/// driven by the background [`Sweeper`] started at construction.
///
/// Dropping the store stops its sweeper and waits for the sweeper thread to
/// exit.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use mini_ttl_cache::{Store, Ttl, Value};
///
/// let store: Store = Store::new(Duration::from_secs(60), Duration::ZERO).unwrap();
/// store.set("hits", 0u64, Ttl::Never);
/// store.increment("hits", 1).unwrap();
/// assert_eq!(store.get("hits"), Some(Value::from(1u64)));
/// ```
pub struct Store<V = Value> {
    pub(crate) shared: Arc<Shared<V>>,
    sweeper: Option<Sweeper>,
}

impl<V> Store<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructors ==
    /// Creates an empty store.
    ///
    /// A zero `default_ttl` means entries written with [`Ttl::Default`] never
    /// expire. A zero `sweep_interval` disables background sweeping.
    ///
    /// # Errors
    /// Returns [`CacheError::Sweeper`] if the sweeper thread cannot be started.
    pub fn new(default_ttl: Duration, sweep_interval: Duration) -> Result<Self> {
        Self::with_entries(default_ttl, sweep_interval, HashMap::new())
    }

    /// Creates a store seeded with `entries`, e.g. a previous [`Store::snapshot`].
    ///
    /// Seeded entries keep their own expiration instants.
    pub fn with_entries(
        default_ttl: Duration,
        sweep_interval: Duration,
        entries: HashMap<String, Entry<V>>,
    ) -> Result<Self> {
        let default_ttl = (!default_ttl.is_zero()).then_some(default_ttl);

        debug!(
            default_ttl = ?default_ttl,
            sweep_interval = ?sweep_interval,
            seeded = entries.len(),
            "Creating cache store"
        );

        let shared = Arc::new(Shared {
            state: RwLock::new(StoreState {
                entries,
                on_evicted: None,
            }),
            default_ttl,
            stats: StatsRecorder::default(),
        });

        let sweeper = if sweep_interval.is_zero() {
            None
        } else {
            Some(Sweeper::spawn(Arc::downgrade(&shared), sweep_interval)?)
        };

        Ok(Self { shared, sweeper })
    }

    /// Creates an empty store from a [`CacheConfig`].
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Self::new(config.default_ttl, config.sweep_interval)
    }

    // == Set ==
    /// Inserts or overwrites `key`. Overwriting does not fire the eviction callback.
    pub fn set(&self, key: impl Into<String>, value: impl Into<V>, ttl: Ttl) {
        let entry = self.new_entry(value.into(), ttl);
        self.shared.state.write().entries.insert(key.into(), entry);
    }

    /// Inserts or overwrites `key` with the store's default TTL.
    pub fn set_default(&self, key: impl Into<String>, value: impl Into<V>) {
        self.set(key, value, Ttl::Default);
    }

    // == Add ==
    /// Inserts `key` only if it has no live entry. An expired entry is overwritten.
    ///
    /// # Errors
    /// Returns [`CacheError::AlreadyExists`] if a live entry is present.
    pub fn add(&self, key: impl Into<String>, value: impl Into<V>, ttl: Ttl) -> Result<()> {
        let key = key.into();
        let mut state = self.shared.state.write();

        if state.entries.get(&key).is_some_and(|entry| !entry.is_expired()) {
            return Err(CacheError::AlreadyExists(key));
        }

        let entry = self.new_entry(value.into(), ttl);
        state.entries.insert(key, entry);
        Ok(())
    }

    // == Replace ==
    /// Overwrites `key` only if it has a live entry.
    ///
    /// # Errors
    /// Returns [`CacheError::NotFound`] if the key is missing or expired.
    pub fn replace(&self, key: impl Into<String>, value: impl Into<V>, ttl: Ttl) -> Result<()> {
        let key = key.into();
        let mut state = self.shared.state.write();

        if !state.entries.get(&key).is_some_and(|entry| !entry.is_expired()) {
            return Err(CacheError::NotFound(key));
        }

        let entry = self.new_entry(value.into(), ttl);
        state.entries.insert(key, entry);
        Ok(())
    }

    // == Get ==
    /// Returns a copy of the value if `key` is present and not expired.
    pub fn get(&self, key: &str) -> Option<V> {
        self.get_with_expiration(key).map(|(value, _)| value)
    }

    /// Like [`Store::get`], also returning the expiration instant (None if the
    /// entry never expires).
    pub fn get_with_expiration(&self, key: &str) -> Option<(V, Option<DateTime<Utc>>)> {
        let found = {
            let state = self.shared.state.read();
            state
                .entries
                .get(key)
                .filter(|entry| !entry.is_expired())
                .map(|entry| (entry.value.clone(), entry.expires_at))
        };

        self.shared.stats.record_lookup(found.is_some());
        found
    }

    // == Delete ==
    /// Removes `key` if present, firing the eviction callback once after the
    /// lock is released. Returns whether an entry was removed.
    pub fn delete(&self, key: &str) -> bool {
        let (removed, callback) = {
            let mut state = self.shared.state.write();
            let removed = state.entries.remove_entry(key);
            (removed, state.on_evicted.clone())
        };

        match removed {
            Some((key, entry)) => {
                self.shared.notify(callback, vec![(key, entry.value)]);
                true
            }
            None => false,
        }
    }

    // == Purge Expired ==
    /// Removes every expired entry and fires the eviction callback once per
    /// removed entry, after the lock is released. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        self.shared.purge_expired()
    }

    // == Snapshot ==
    /// Copies all unexpired entries. The copy is not kept in sync with the store.
    pub fn snapshot(&self) -> HashMap<String, Entry<V>> {
        let now = Utc::now();
        let state = self.shared.state.read();
        state
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired_at(now))
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect()
    }

    // == Count ==
    /// Number of entries in the map, including expired entries not yet purged.
    pub fn count(&self) -> usize {
        self.shared.state.read().entries.len()
    }

    /// True if the map holds no entries at all, expired ones included.
    pub fn is_empty(&self) -> bool {
        self.shared.state.read().entries.is_empty()
    }

    // == Flush ==
    /// Drops every entry without firing the eviction callback.
    pub fn flush(&self) {
        let old = std::mem::take(&mut self.shared.state.write().entries);
        drop(old);
    }

    // == Eviction Callback ==
    /// Registers the hook fired for every entry removed by `delete` or
    /// `purge_expired`, replacing any previous one.
    pub fn set_eviction_callback<F>(&self, callback: F)
    where
        F: Fn(&str, V) + Send + Sync + 'static,
    {
        self.shared.state.write().on_evicted = Some(Arc::new(callback));
    }

    // == Accessors ==
    /// TTL applied by [`Ttl::Default`]; None means never expire.
    pub fn default_ttl(&self) -> Option<Duration> {
        self.shared.default_ttl
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let total = self.count();
        self.shared.stats.snapshot(total)
    }

    /// The background sweeper, if one was started.
    pub fn sweeper(&self) -> Option<&Sweeper> {
        self.sweeper.as_ref()
    }

    fn new_entry(&self, value: V, ttl: Ttl) -> Entry<V> {
        let ttl = match ttl {
            Ttl::Default => self.shared.default_ttl,
            Ttl::Never => None,
            Ttl::After(ttl) => Some(ttl),
        };
        Entry::new(value, ttl)
    }

    #[cfg(test)]
    pub(crate) fn downgrade(&self) -> std::sync::Weak<Shared<V>> {
        Arc::downgrade(&self.shared)
    }
}

impl<V> Store<V> {
    /// Stops the background sweeper, if any. Safe to call repeatedly.
    pub fn stop_sweeper(&self) {
        if let Some(sweeper) = &self.sweeper {
            sweeper.stop();
        }
    }
}

impl<V> Drop for Store<V> {
    fn drop(&mut self) {
        self.stop_sweeper();
    }
}

impl<V> std::fmt::Debug for Store<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("entries", &self.shared.state.read().entries.len())
            .field("default_ttl", &self.shared.default_ttl)
            .field("sweeper", &self.sweeper)
            .finish()
    }
}
