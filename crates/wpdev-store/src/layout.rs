use crate::StoreError;
use std::fs;
use std::path::{Path, PathBuf};

const COMPOSE_FILE: &str = "docker-compose.yml";
const CACHE_FILE: &str = "cache.json";
/// Suffix compose appends to the project name for the application data volume.
const DATA_VOLUME_SUFFIX: &str = "_wordpress";

/// Directory layout of a project's work directory.
///
/// The work directory lives outside the project tree and is owned by wpdev.
/// Its basename is the compose project name.
#[derive(Debug, Clone)]
pub struct WorkLayout {
    root: PathBuf,
}

impl WorkLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn compose_file(&self) -> PathBuf {
        self.root.join(COMPOSE_FILE)
    }

    #[inline]
    pub fn cache_file(&self) -> PathBuf {
        self.root.join(CACHE_FILE)
    }

    /// Compose project name, derived from the work directory basename.
    pub fn project_name(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Name of the persistent application data volume created by compose.
    pub fn data_volume(&self) -> String {
        format!("{}{DATA_VOLUME_SUFFIX}", self.project_name())
    }

    pub fn initialize(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }
}
