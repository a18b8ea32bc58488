//! Time-bounded memoization of computed values, keyed by name.
//!
//! Entries expire lazily: there is no background eviction thread, an entry
//! past its deadline is simply treated as absent on the next access.  All
//! operations go through one internal lock, so a `clear` racing an in-flight
//! `get_or_compute` can never observe a partially-written entry.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Single global expiry policy: one hour for every entry.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

struct Entry<T> {
    value: T,
    expires_at: Instant,
}

/// An in-memory cache mapping string keys to values of one type, each with
/// an absolute expiry deadline.  Values are cloned out on read; callers must
/// never rely on mutating a returned value in place.
pub struct TtlCache<T> {
    entries: Mutex<HashMap<String, Entry<T>>>,
}

impl<T> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TtlCache<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    // A poisoned lock still holds a coherent map; keep serving from it.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Evict all entries unconditionally, regardless of TTL.
    pub fn clear(&self) {
        let mut entries = self.lock();
        if !entries.is_empty() {
            log::debug!("cache cleared ({} entries)", entries.len());
        }
        entries.clear();
    }

    /// Number of unexpired entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.lock()
            .values()
            .filter(|entry| now < entry.expires_at)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> TtlCache<T> {
    /// Look up a value; expired entries are treated as absent and dropped.
    pub fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                log::debug!("cache entry expired: {key}");
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a value with expiry = now + `ttl`, overwriting any existing
    /// entry under the same key.
    pub fn put(&self, key: &str, value: T, ttl: Duration) {
        self.lock().insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Return the cached value if present and unexpired; otherwise invoke
    /// `producer`, store its result and return it.  The lock is held across
    /// the producer call, so concurrent callers of the same key compute at
    /// most once per expiry window.
    pub fn get_or_compute(&self, key: &str, ttl: Duration, producer: impl FnOnce() -> T) -> T {
        let mut entries = self.lock();
        if let Some(entry) = entries.get(key) {
            if Instant::now() < entry.expires_at {
                return entry.value.clone();
            }
        }
        let value = producer();
        entries.insert(
            key.to_string(),
            Entry {
                value: value.clone(),
                expires_at: Instant::now() + ttl,
            },
        );
        value
    }
}
