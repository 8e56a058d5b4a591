//! Bounded concurrent map backed by moka.

use moka::sync::Cache;

/// Bounded, thread-safe key-value cache.
///
/// The manager keeps the abort handle of every pending deferred port check
/// here, keyed by node id, so a check can be cancelled when its node goes away.
#[derive(Clone)]
pub struct MemCache<K, V> {
    entries: Cache<K, V>,
}

impl<K, V> MemCache<K, V>
where
    K: std::hash::Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Cache::new(max_entries as u64),
        }
    }

    pub fn set(
        &self,
        key: K,
        value: V,
    ) {
        self.entries.insert(key, value);
    }

    #[cfg(test)]
    pub fn get(
        &self,
        key: &K,
    ) -> Option<V> {
        self.entries.get(key)
    }

    /// Removes the entry for `key`, returning it if present.
    pub fn remove(
        &self,
        key: &K,
    ) -> Option<V> {
        self.entries.remove(key)
    }

    /// Empties the cache and returns what it held.
    pub fn drain(&self) -> Vec<V> {
        let values = self.entries.iter().map(|(_, value)| value).collect();
        self.entries.invalidate_all();
        values
    }
}
