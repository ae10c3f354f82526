use std::path::Path;

/// Candidate web roots, checked in order. A later match overrides an earlier one.
const PUBLIC_DIRECTORY_CANDIDATES: &[&str] = &["web", "public"];

/// Detect a conventional public directory (`web/` or `public/`) under the
/// project root. Returns the directory name relative to the root.
pub fn detect_public_directory(project_root: &Path) -> Option<&'static str> {
    PUBLIC_DIRECTORY_CANDIDATES
        .iter()
        .rev()
        .copied()
        .find(|candidate| project_root.join(candidate).is_dir())
}
