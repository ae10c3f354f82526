use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Yes/no question put to the user.
pub trait Prompt {
    fn confirm(&self, message: &str) -> bool;
}

/// Answers every question the same way. Used for non-interactive runs and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Prompt for FixedAnswer {
    fn confirm(&self, _message: &str) -> bool {
        self.0
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum LegacyOutcome {
    NotFound,
    Removed(PathBuf),
    Kept(PathBuf),
    RemovalFailed { path: PathBuf, error: String },
}

/// `<parent>/<basename>-wordpress`, where older tool versions installed sites.
pub fn legacy_install_path(project_root: &Path) -> Option<PathBuf> {
    let name = project_root.file_name()?.to_string_lossy();
    let parent = project_root.parent()?;
    Some(parent.join(format!("{name}-wordpress")))
}

/// Offer to delete a legacy install next to the project. Never fails.
pub fn check_legacy_install(project_root: &Path, prompt: &dyn Prompt) -> LegacyOutcome {
    let Some(path) = legacy_install_path(project_root).filter(|p| p.is_dir()) else {
        return LegacyOutcome::NotFound;
    };

    let message = format!(
        "Found a legacy install at {}. It is no longer used. Delete it?",
        path.display()
    );
    if !prompt.confirm(&message) {
        info!("keeping legacy install at {}", path.display());
        return LegacyOutcome::Kept(path);
    }

    match fs::remove_dir_all(&path) {
        Ok(()) => {
            info!("removed legacy install at {}", path.display());
            LegacyOutcome::Removed(path)
        }
        Err(e) => {
            warn!("failed to remove legacy install at {}: {e}", path.display());
            LegacyOutcome::RemovalFailed {
                path,
                error: e.to_string(),
            }
        }
    }
}
