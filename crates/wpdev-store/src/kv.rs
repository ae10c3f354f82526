use crate::layout::WorkLayout;
use crate::{fsync_dir, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub value: String,
    pub updated_at: String,
}

impl CacheEntry {
    fn now(value: &str) -> Self {
        Self {
            value: value.to_owned(),
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A key/value store bound to one scope (a work directory).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, StoreError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Release the store. Writes are durable once `set` returns.
    fn close(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Opens a [`KeyValueStore`] for a scope. Distinct scopes never share entries.
pub trait CacheProvider {
    fn open(&self, scope: &Path) -> Result<Box<dyn KeyValueStore>, StoreError>;
}

/// JSON cache file at `<scope>/cache.json`, rewritten atomically on every `set`.
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
}

impl FileStore {
    pub fn open(scope: &Path) -> Result<Self, StoreError> {
        let layout = WorkLayout::new(scope);
        layout.initialize()?;
        let path = layout.cache_file();

        let entries = if path.exists() {
            let content = fs::read_to_string(&path)?;
            match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    // An unreadable cache only costs one reconfiguration.
                    warn!("ignoring corrupted cache file {}: {e}", path.display());
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };
        debug!("opened cache {} ({} entries)", path.display(), entries.len());

        Ok(Self { path, entries })
    }

    fn persist(&self) -> Result<(), StoreError> {
        let dir = self
            .path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let content = serde_json::to_string_pretty(&self.entries)?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        fsync_dir(&dir)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_owned(), CacheEntry::now(value));
        self.persist()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FileCacheProvider;

impl CacheProvider for FileCacheProvider {
    fn open(&self, scope: &Path) -> Result<Box<dyn KeyValueStore>, StoreError> {
        Ok(Box::new(FileStore::open(scope)?))
    }
}

type SharedScopes = Arc<Mutex<HashMap<PathBuf, BTreeMap<String, CacheEntry>>>>;

/// In-memory cache provider. Stores opened from clones of one provider share
/// state, so entries survive across "runs" within a process.
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheProvider {
    scopes: SharedScopes,
}

impl MemoryCacheProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read an entry directly, bypassing `open`.
    pub fn peek(&self, scope: &Path, key: &str) -> Option<CacheEntry> {
        let scopes = self.scopes.lock().ok()?;
        scopes.get(scope).and_then(|entries| entries.get(key).cloned())
    }
}

impl CacheProvider for MemoryCacheProvider {
    fn open(&self, scope: &Path) -> Result<Box<dyn KeyValueStore>, StoreError> {
        Ok(Box::new(MemoryStore {
            scope: scope.to_path_buf(),
            scopes: Arc::clone(&self.scopes),
        }))
    }
}

pub struct MemoryStore {
    scope: PathBuf,
    scopes: SharedScopes,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, StoreError> {
        let scopes = self.scopes.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(scopes
            .get(&self.scope)
            .and_then(|entries| entries.get(key).cloned()))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut scopes = self.scopes.lock().map_err(|_| StoreError::Poisoned)?;
        scopes
            .entry(self.scope.clone())
            .or_default()
            .insert(key.to_owned(), CacheEntry::now(value));
        Ok(())
    }
}
