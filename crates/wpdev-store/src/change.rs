use crate::kv::{CacheProvider, KeyValueStore};
use crate::StoreError;
use std::path::Path;
use tracing::debug;

/// Cache key holding the checksum of the last successfully provisioned configuration.
pub const CONFIG_CACHE_KEY: &str = "config_checksum";

/// Change detection over a scoped key/value store.
///
/// `has_changed` never mutates. `commit` must only be called once the work the
/// change gates has completed, otherwise a later run would skip it.
pub struct ChangeCache {
    store: Box<dyn KeyValueStore>,
}

impl ChangeCache {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn open(provider: &dyn CacheProvider, scope: &Path) -> Result<Self, StoreError> {
        Ok(Self::new(provider.open(scope)?))
    }

    /// True if no value is stored for `key`, or the stored value differs from `value`.
    pub fn has_changed(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let changed = match self.store.get(key)? {
            Some(entry) => entry.value != value,
            None => true,
        };
        debug!("cache key '{key}' changed: {changed}");
        Ok(changed)
    }

    pub fn commit(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        debug!("committing cache key '{key}'");
        self.store.set(key, value)
    }

    pub fn close(self) -> Result<(), StoreError> {
        self.store.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::{FileCacheProvider, MemoryCacheProvider};

    #[test]
    fn changed_until_committed() {
        let provider = MemoryCacheProvider::new();
        let scope = Path::new("/work/a");

        for _ in 0..3 {
            let cache = ChangeCache::open(&provider, scope).unwrap();
            assert!(cache.has_changed(CONFIG_CACHE_KEY, "sum-1").unwrap());
        }

        let mut cache = ChangeCache::open(&provider, scope).unwrap();
        cache.commit(CONFIG_CACHE_KEY, "sum-1").unwrap();
        cache.close().unwrap();

        let cache = ChangeCache::open(&provider, scope).unwrap();
        assert!(!cache.has_changed(CONFIG_CACHE_KEY, "sum-1").unwrap());
        assert!(cache.has_changed(CONFIG_CACHE_KEY, "sum-2").unwrap());
    }

    #[test]
    fn has_changed_does_not_mutate() {
        let provider = MemoryCacheProvider::new();
        let scope = Path::new("/work/a");
        let cache = ChangeCache::open(&provider, scope).unwrap();
        cache.has_changed(CONFIG_CACHE_KEY, "sum").unwrap();
        assert!(provider.peek(scope, CONFIG_CACHE_KEY).is_none());
    }

    #[test]
    fn scopes_are_isolated() {
        let provider = MemoryCacheProvider::new();
        let mut a = ChangeCache::open(&provider, Path::new("/work/a")).unwrap();
        a.commit(CONFIG_CACHE_KEY, "sum").unwrap();

        let b = ChangeCache::open(&provider, Path::new("/work/b")).unwrap();
        assert!(b.has_changed(CONFIG_CACHE_KEY, "sum").unwrap());
    }

    #[test]
    fn file_backed_gating_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = ChangeCache::open(&FileCacheProvider, dir.path()).unwrap();
        assert!(cache.has_changed(CONFIG_CACHE_KEY, "sum").unwrap());
        cache.commit(CONFIG_CACHE_KEY, "sum").unwrap();
        cache.close().unwrap();

        let cache = ChangeCache::open(&FileCacheProvider, dir.path()).unwrap();
        assert!(!cache.has_changed(CONFIG_CACHE_KEY, "sum").unwrap());
    }
}
