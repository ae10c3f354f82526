//! Work-directory layout and persistent change cache for wpdev.
//!
//! This crate provides the storage layer: `WorkLayout` for the tool-owned
//! per-project directory (compose document, cache file), the `KeyValueStore`
//! and `CacheProvider` seams with file-backed and in-memory implementations,
//! and `ChangeCache`, which decides whether reconfiguration is needed.

pub mod change;
pub mod kv;
pub mod layout;

pub use change::{ChangeCache, CONFIG_CACHE_KEY};
pub use kv::{
    CacheEntry, CacheProvider, FileCacheProvider, FileStore, KeyValueStore, MemoryCacheProvider,
    MemoryStore,
};
pub use layout::WorkLayout;

use std::path::Path;
use thiserror::Error;

/// Fsync a directory so a preceding `rename()` is durable.
pub(crate) fn fsync_dir(dir: &Path) -> Result<(), std::io::Error> {
    let f = std::fs::File::open(dir)?;
    f.sync_all()
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("cache lock poisoned")]
    Poisoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display_io() {
        let e = StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk gone"));
        assert!(e.to_string().contains("disk gone"));
    }

    #[test]
    fn store_error_display_poisoned() {
        assert!(StoreError::Poisoned.to_string().contains("poisoned"));
    }
}
