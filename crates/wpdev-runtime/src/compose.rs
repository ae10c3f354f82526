use crate::topology::Topology;
use crate::RuntimeError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;
use wpdev_store::WorkLayout;

/// A topology bound to the compose file it is written to.
///
/// The compose project name is the basename of the work directory, which is
/// what prefixes the named volumes the engine creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeProject {
    pub compose_file: PathBuf,
    pub topology: Topology,
}

impl ComposeProject {
    pub fn new(layout: &WorkLayout, topology: Topology) -> Self {
        Self {
            compose_file: layout.compose_file(),
            topology,
        }
    }

    pub fn render(&self) -> Result<String, RuntimeError> {
        Ok(serde_yaml::to_string(&self.topology)?)
    }

    /// Write the compose document atomically, creating the parent directory.
    pub fn write(&self) -> Result<(), RuntimeError> {
        let dir = self
            .compose_file
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        std::fs::create_dir_all(&dir)?;

        let content = self.render()?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.compose_file)
            .map_err(|e| RuntimeError::Io(e.error))?;
        debug!("wrote compose file {}", self.compose_file.display());
        Ok(())
    }

    pub(crate) fn ensure_service(&self, service: &str) -> Result<(), RuntimeError> {
        if self.topology.has_service(service) {
            Ok(())
        } else {
            Err(RuntimeError::UnknownService(service.to_owned()))
        }
    }
}
