use crate::topology::WEB_ROOT;
use indexmap::IndexSet;
use std::path::Path;
use wpdev_schema::EnvironmentSpec;

/// Volume mounts for the application and command-runner services.
///
/// The project root is always mounted at the web root first. Each mapping
/// follows in declaration order: an absolute host path is mounted at
/// `/<key>`, anything else under the web root. Relative host paths are
/// anchored to the project root, since the compose file lives in the work
/// directory. Identical pairs collapse to their first occurrence.
pub fn resolve_mounts(project_root: &Path, env: &EnvironmentSpec) -> Vec<String> {
    let mut mounts = IndexSet::new();
    mounts.insert(format!("{}:{WEB_ROOT}", project_root.display()));

    for (directory, mapping) in &env.mappings {
        let directory = directory.trim_start_matches('/');
        let mount = if mapping.is_absolute() {
            format!("{}:/{directory}", mapping.path)
        } else {
            let host = project_root.join(mapping.path.trim_start_matches("./"));
            format!("{}:{WEB_ROOT}/{directory}", host.display())
        };
        mounts.insert(mount);
    }

    mounts.into_iter().collect()
}
