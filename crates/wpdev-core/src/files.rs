//! Files the start cycle creates or removes in the project root.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

pub const INDEX_FILE: &str = "index.php";
const INDEX_CONTENT: &str = "<?php // Silence is golden.";

/// Written into the project root by the containers on every start.
pub const GENERATED_FILES: [&str; 2] = ["wp-config.php", "phpunit-wp-config.php"];

/// Create a placeholder `index.php` so the web root is servable. Returns true
/// if the file was created.
pub fn ensure_index_file(project_root: &Path) -> Result<bool, std::io::Error> {
    let path = project_root.join(INDEX_FILE);
    if path.exists() {
        return Ok(false);
    }
    fs::write(&path, INDEX_CONTENT)?;
    debug!("created {}", path.display());
    Ok(true)
}

/// Remove generated files. Missing files are fine; any other failure becomes
/// a warning in the returned list.
pub fn remove_generated_files(project_root: &Path) -> Vec<String> {
    let mut warnings = Vec::new();
    for name in GENERATED_FILES {
        let path = project_root.join(name);
        match fs::remove_file(&path) {
            Ok(()) => debug!("removed {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                warn!("failed to remove {}: {e}", path.display());
                warnings.push(format!("could not remove {}: {e}", path.display()));
            }
        }
    }
    warnings
}
